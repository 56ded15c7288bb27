use thiserror::Error;

/// 视频适配层错误
#[derive(Error, Debug)]
pub enum VideoError {
    /// 没有任何适配器声明支持该设备
    #[error("no stream adapter available for device {device_id}")]
    NoAdapterAvailable { device_id: String },

    /// 流标识不在活跃流表中
    #[error("stream not found: {0}")]
    StreamNotFound(String),

    /// 设备信息不满足建流前提
    #[error("invalid device for streaming: {0}")]
    InvalidDevice(String),

    /// 流地址拼装失败
    #[error("failed to build stream url: {0}")]
    UrlBuild(#[from] url::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VideoError>;
