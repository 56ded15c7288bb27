use thiserror::Error;

/// 管道硬错误
///
/// 只有配置/资源不可用类问题允许以错误形式出管道边界，
/// 设备级失败一律折叠进 `CommandResult`。
#[derive(Error, Debug)]
pub enum PipelineError {
    /// 请求参数非法（编程错误，快速失败）
    #[error("Invalid command request: {0}")]
    InvalidRequest(String),

    /// 连接池耗尽或已关闭
    #[error("Connection pool exhausted for device {device_id}: {reason}")]
    PoolExhausted { device_id: String, reason: String },

    /// 其他错误
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// 管道结果类型
pub type Result<T> = std::result::Result<T, PipelineError>;
