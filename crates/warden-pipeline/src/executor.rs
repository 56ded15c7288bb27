use crate::error::{PipelineError, Result};
use crate::error_code;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use warden_pool::{PoolError, PoolManager};
use warden_types::{CommandRequest, CommandResult, DeviceConnection};

/// 统一指令执行接口
///
/// 链上每一环（基础执行、重试、日志）都实现同一契约，
/// 最外层装饰器先被调用，逐层向内委托。
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// 执行指令
    ///
    /// 设备级失败以 `CommandResult` 值返回；
    /// `Err` 仅用于池耗尽和非法请求这类硬错误。
    async fn execute(&self, request: &CommandRequest) -> Result<CommandResult>;
}

/// 设备传输接口
///
/// 基础执行器在借出的连接上通过它完成真正的收发，
/// 具体字节细节由协议层实现。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    async fn send(
        &self,
        conn: &DeviceConnection,
        request: &CommandRequest,
    ) -> anyhow::Result<Value>;
}

/// 基础执行器
///
/// 每次调用从池借出连接、收发、归还；
/// 任何传输异常折叠成失败结果，连接在所有退出路径上都会归还或销毁。
pub struct TransportExecutor {
    pool: Arc<PoolManager>,
    transport: Arc<dyn DeviceTransport>,
}

impl TransportExecutor {
    pub fn new(pool: Arc<PoolManager>, transport: Arc<dyn DeviceTransport>) -> Self {
        Self { pool, transport }
    }
}

#[async_trait]
impl CommandExecutor for TransportExecutor {
    async fn execute(&self, request: &CommandRequest) -> Result<CommandResult> {
        if request.device_id.trim().is_empty() {
            return Err(PipelineError::InvalidRequest(
                "device id must not be empty".to_string(),
            ));
        }
        if request.command_type.trim().is_empty() {
            return Err(PipelineError::InvalidRequest(
                "command type must not be empty".to_string(),
            ));
        }

        let conn = match self.pool.borrow(&request.device_id).await {
            Ok(conn) => conn,
            Err(PoolError::AcquisitionTimeout { device_id, waited_ms }) => {
                return Err(PipelineError::PoolExhausted {
                    device_id,
                    reason: format!("acquisition timed out after {}ms", waited_ms),
                });
            }
            Err(PoolError::PoolClosed(device_id)) => {
                return Err(PipelineError::PoolExhausted {
                    device_id,
                    reason: "pool closed".to_string(),
                });
            }
            Err(e) => {
                // 建连失败是瞬时故障，交给重试层
                return Ok(CommandResult::failure(
                    error_code::CONNECTION_CREATE_ERROR,
                    e.to_string(),
                ));
            }
        };

        debug!(
            device_id = %request.device_id,
            connection_id = %conn.connection_id,
            command_type = %request.command_type,
            "Dispatching command"
        );

        match self.transport.send(&conn, request).await {
            Ok(data) => {
                self.pool.give_back(&request.device_id, conn).await;
                Ok(CommandResult::ok("command executed", Some(data)))
            }
            Err(e) => {
                warn!(
                    device_id = %request.device_id,
                    error = %e,
                    "Command transport failed, invalidating connection"
                );
                // 收发失败的连接状态不可信，销毁而非复用
                self.pool.invalidate(&request.device_id, conn).await;
                Ok(CommandResult::failure(
                    error_code::COMMAND_EXECUTION_FAILURE,
                    e.to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_pool::{PoolConfig, TransportConnectionFactory};

    fn pool_manager() -> Arc<PoolManager> {
        Arc::new(PoolManager::new(
            Arc::new(TransportConnectionFactory::default()),
            PoolConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_successful_send_returns_ok_result() {
        let mut transport = MockDeviceTransport::new();
        transport
            .expect_send()
            .returning(|_, _| Ok(serde_json::json!({"status": "opened"})));

        let executor = TransportExecutor::new(pool_manager(), Arc::new(transport));
        let request = CommandRequest::new("dev_001", "OPEN_DOOR", vec![0x01]);

        let result = executor.execute(&request).await.unwrap();
        assert!(result.success);
        assert_eq!(
            result.data.unwrap()["status"],
            serde_json::json!("opened")
        );
    }

    #[tokio::test]
    async fn test_transport_error_becomes_failed_result() {
        let mut transport = MockDeviceTransport::new();
        transport
            .expect_send()
            .returning(|_, _| Err(anyhow::anyhow!("device unreachable")));

        let pool = pool_manager();
        let executor = TransportExecutor::new(pool.clone(), Arc::new(transport));
        let request = CommandRequest::new("dev_001", "OPEN_DOOR", vec![0x01]);

        let result = executor.execute(&request).await.unwrap();
        assert!(result.is_failure());
        assert_eq!(
            result.error_code.as_deref(),
            Some(error_code::COMMAND_EXECUTION_FAILURE)
        );
        // 失败路径不得泄漏连接
        let stats = pool.statistics("dev_001").await.unwrap();
        assert_eq!(stats.active, 0);
    }

    #[tokio::test]
    async fn test_invalid_request_fails_fast() {
        let transport = MockDeviceTransport::new();
        let executor = TransportExecutor::new(pool_manager(), Arc::new(transport));
        let request = CommandRequest::new("", "OPEN_DOOR", vec![]);

        let result = executor.execute(&request).await;
        assert!(matches!(result, Err(PipelineError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_pool_exhaustion_surfaces_as_hard_error() {
        let config = PoolConfig {
            max_total: 1,
            max_idle: 1,
            min_idle: 0,
            max_wait_millis: 50,
            connection_max_age_ms: 3_600_000,
        };
        let pool = Arc::new(PoolManager::new(
            Arc::new(TransportConnectionFactory::default()),
            config,
        ));
        // 占住唯一连接
        let held = pool.borrow("dev_001").await.unwrap();

        let transport = MockDeviceTransport::new();
        let executor = TransportExecutor::new(pool.clone(), Arc::new(transport));
        let request = CommandRequest::new("dev_001", "OPEN_DOOR", vec![]);

        let result = executor.execute(&request).await;
        assert!(matches!(result, Err(PipelineError::PoolExhausted { .. })));

        pool.give_back("dev_001", held).await;
    }
}
