//! RS485 工业串行协议服务
//!
//! 帧编解码（Modbus RTU 风格 CRC16）、每设备会话状态机、
//! 心跳与状态查询，消息经由指令管道下发。

pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod service;
pub mod session;
pub mod types;

pub use catalog::{is_device_model_supported, supported_device_models, vendor_catalog};
pub use codec::{Rs485Frame, FUNCTION_HEARTBEAT};
pub use config::Rs485Config;
pub use error::{DecodeError, Rs485Error, Result};
pub use service::Rs485ProtocolService;
pub use session::{Rs485Session, SessionState};
pub use types::{DeviceStatus, HeartbeatResult, InitResult, ProcessResult};
