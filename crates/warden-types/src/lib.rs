//! 设备通讯网关共享数据模型
//!
//! 连接、指令、视频流和监控快照的纯数据类型，
//! 各子系统（连接池、指令管道、RS485、视频、监控）共用。

pub mod command;
pub mod connection;
pub mod device;
pub mod snapshot;
pub mod stream;

pub use command::{CommandRequest, CommandResult};
pub use connection::{DeviceConnection, PoolStatistics};
pub use device::{DeviceInfo, DeviceKind, ProtocolType, VendorInfo};
pub use snapshot::DeviceStatusSnapshot;
pub use stream::{StreamProtocol, VideoStreamDescriptor};
