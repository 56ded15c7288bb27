use crate::error::Result;
use crate::error_code;
use crate::executor::CommandExecutor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{info, warn};
use warden_types::{CommandRequest, CommandResult};

/// 默认追加重试次数
pub const MAX_RETRY_COUNT: u32 = 3;

/// 默认重试间隔（毫秒）
pub const RETRY_DELAY_MS: u64 = 1000;

/// 重试策略
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// 首次之外最多追加的尝试次数
    pub max_retry_count: u32,

    /// 两次尝试之间的固定间隔（毫秒）
    pub retry_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retry_count: MAX_RETRY_COUNT,
            retry_delay_ms: RETRY_DELAY_MS,
        }
    }
}

/// 重试装饰器
///
/// 失败结果最多追加 `max_retry_count` 次尝试，间隔固定；
/// 首个成功立即返回，耗尽后返回最后一次失败。
/// 等待期间收到取消信号则中止本次调用，结果打 `RETRY_INTERRUPTED` 标记。
/// 硬错误（`Err`）不属于瞬时故障，直接透传不重试。
pub struct RetryExecutor {
    inner: Arc<dyn CommandExecutor>,
    policy: RetryPolicy,
    cancel: Option<watch::Receiver<bool>>,
}

impl RetryExecutor {
    pub fn new(
        inner: Arc<dyn CommandExecutor>,
        policy: RetryPolicy,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Self {
        Self {
            inner,
            policy,
            cancel,
        }
    }

    /// 重试间隔内等待，被取消返回 false
    async fn wait_before_retry(&self) -> bool {
        let delay = Duration::from_millis(self.policy.retry_delay_ms);
        let Some(mut cancel) = self.cancel.clone() else {
            sleep(delay).await;
            return true;
        };

        if *cancel.borrow() {
            return false;
        }

        let sleep_fut = sleep(delay);
        tokio::pin!(sleep_fut);
        loop {
            tokio::select! {
                _ = &mut sleep_fut => return true,
                changed = cancel.changed() => {
                    if *cancel.borrow() {
                        return false;
                    }
                    if changed.is_err() {
                        // 发送端已不存在，不可能再取消，等满剩余延迟
                        (&mut sleep_fut).await;
                        return true;
                    }
                }
            }
        }
    }
}

#[async_trait]
impl CommandExecutor for RetryExecutor {
    async fn execute(&self, request: &CommandRequest) -> Result<CommandResult> {
        let started = Instant::now();
        let mut last_failure: Option<CommandResult> = None;

        // 共 max_retry_count + 1 次尝试
        for attempt in 0..=self.policy.max_retry_count {
            if attempt > 0 && !self.wait_before_retry().await {
                warn!(
                    device_id = %request.device_id,
                    attempt = %attempt,
                    elapsed_ms = %started.elapsed().as_millis(),
                    "Retry interrupted"
                );
                return Ok(CommandResult::failure(
                    error_code::RETRY_INTERRUPTED,
                    "retry aborted by cancellation signal",
                ));
            }

            let result = self.inner.execute(request).await?;
            if result.success {
                if attempt > 0 {
                    info!(
                        device_id = %request.device_id,
                        retries = %attempt,
                        elapsed_ms = %started.elapsed().as_millis(),
                        "Command succeeded after retry"
                    );
                }
                return Ok(result);
            }

            warn!(
                device_id = %request.device_id,
                command_type = %request.command_type,
                attempt = %(attempt + 1),
                max_attempts = %(self.policy.max_retry_count + 1),
                error_code = %result.error_code.as_deref().unwrap_or("UNKNOWN"),
                elapsed_ms = %started.elapsed().as_millis(),
                "Command attempt failed"
            );
            last_failure = Some(result);
        }

        let last = last_failure
            .unwrap_or_else(|| CommandResult::failure(error_code::RETRY_EXHAUSTED, "no attempt"));
        warn!(
            device_id = %request.device_id,
            attempts = %(self.policy.max_retry_count + 1),
            elapsed_ms = %started.elapsed().as_millis(),
            "Retries exhausted"
        );
        Ok(CommandResult::failure(
            error_code::RETRY_EXHAUSTED,
            format!(
                "all {} attempts failed, last error: {}",
                self.policy.max_retry_count + 1,
                last.message
            ),
        ))
    }
}
