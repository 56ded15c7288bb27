use crate::error::Result;
use crate::executor::CommandExecutor;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use warden_types::{CommandRequest, CommandResult};

/// 日志装饰器
///
/// 在委托前后各记录一次事件并统计耗时，不改写结果。
pub struct LoggingExecutor {
    inner: Arc<dyn CommandExecutor>,
}

impl LoggingExecutor {
    pub fn new(inner: Arc<dyn CommandExecutor>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl CommandExecutor for LoggingExecutor {
    async fn execute(&self, request: &CommandRequest) -> Result<CommandResult> {
        info!(
            device_id = %request.device_id,
            command_type = %request.command_type,
            payload_bytes = %request.command_data.len(),
            "Command started"
        );
        let started = Instant::now();

        let outcome = self.inner.execute(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(result) => {
                info!(
                    device_id = %request.device_id,
                    command_type = %request.command_type,
                    success = %result.success,
                    error_code = %result.error_code.as_deref().unwrap_or("-"),
                    elapsed_ms = %elapsed_ms,
                    "Command finished"
                );
            }
            Err(e) => {
                error!(
                    device_id = %request.device_id,
                    command_type = %request.command_type,
                    error = %e,
                    elapsed_ms = %elapsed_ms,
                    "Command failed hard"
                );
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl CommandExecutor for Echo {
        async fn execute(&self, request: &CommandRequest) -> Result<CommandResult> {
            Ok(CommandResult::ok(
                format!("echo {}", request.command_type),
                None,
            ))
        }
    }

    #[tokio::test]
    async fn test_logging_does_not_alter_result() {
        let logging = LoggingExecutor::new(Arc::new(Echo));
        let request = CommandRequest::new("dev_001", "QUERY_STATUS", vec![1, 2, 3]);

        let result = logging.execute(&request).await.unwrap();
        assert!(result.success);
        assert_eq!(result.message, "echo QUERY_STATUS");
    }
}
