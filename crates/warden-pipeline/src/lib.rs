//! 指令执行管道
//!
//! 同一 `execute(request) -> result` 契约上的可组合链：
//! 基础执行器负责取连接、收发并把传输异常折叠成失败结果，
//! 重试与日志装饰器各自叠加一种横切行为。
//! 组合顺序在部署期固定：日志包重试，重试包基础执行。

pub mod error;
pub mod error_code;
pub mod executor;
pub mod logging;
pub mod retry;

pub use error::{PipelineError, Result};
pub use executor::{CommandExecutor, DeviceTransport, TransportExecutor};
pub use logging::LoggingExecutor;
pub use retry::{RetryExecutor, RetryPolicy};

use std::sync::Arc;
use tokio::sync::watch;

/// 按固定顺序组装管道：日志 → 重试 → 基础执行
///
/// 启动时组装一次，之后整条链以 `Arc<dyn CommandExecutor>` 传递。
pub fn build_pipeline(
    basic: Arc<dyn CommandExecutor>,
    policy: RetryPolicy,
    cancel: Option<watch::Receiver<bool>>,
) -> Arc<dyn CommandExecutor> {
    let retry = Arc::new(RetryExecutor::new(basic, policy, cancel));
    Arc::new(LoggingExecutor::new(retry))
}
