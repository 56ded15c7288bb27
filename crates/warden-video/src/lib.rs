//! 视频传输适配器注册表
//!
//! RTSP/RTMP/HTTP 三类适配器各自声明厂商与整数优先级，
//! 注册表按优先级确定性选择并产出流描述符。
//! 这里只做 URL 模板化，不做字节级握手，描述符交给外部流媒体消费方。

pub mod adapter;
pub mod error;
pub mod registry;

pub use adapter::{HttpAdapter, RtmpAdapter, RtspAdapter, StreamAdapter};
pub use error::{Result, VideoError};
pub use registry::AdapterRegistry;
