use thiserror::Error;

/// 连接池错误类型
#[derive(Error, Debug)]
pub enum PoolError {
    /// 传输层创建连接失败
    #[error("Connection create failed for device {device_id}: {reason}")]
    CreateFailed { device_id: String, reason: String },

    /// 等待可用连接超时
    #[error("Connection acquisition timed out for device {device_id} after {waited_ms}ms")]
    AcquisitionTimeout { device_id: String, waited_ms: u64 },

    /// 借出校验失败
    #[error("Connection validation failed: {0}")]
    ValidationFailed(String),

    /// 连接池已关闭
    #[error("Pool closed for device {0}")]
    PoolClosed(String),

    /// 其他错误
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// 连接池结果类型
pub type Result<T> = std::result::Result<T, PoolError>;
