use serde::{Deserialize, Serialize};

/// 视频流传输协议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamProtocol {
    Rtsp,
    Rtmp,
    /// HTTP-HLS
    Http,
}

impl StreamProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rtsp => "rtsp",
            Self::Rtmp => "rtmp",
            Self::Http => "http",
        }
    }

    /// 协议默认端口
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Rtsp => 554,
            Self::Rtmp => 1935,
            Self::Http => 80,
        }
    }
}

/// 视频流描述符
///
/// 适配器产出的播放地址与编码参数，交给外部流媒体消费方，
/// 网关本身不做帧级握手。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoStreamDescriptor {
    pub device_id: String,
    pub stream_id: String,
    pub stream_url: String,
    pub protocol: StreamProtocol,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    /// 码率（kbps）
    pub bitrate: u32,
}
