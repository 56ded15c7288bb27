//! 设备监控
//!
//! 周期性/按需采样设备状态，维护每设备的有界快照历史，
//! 并根据最近窗口内的错误标记圈出问题设备。
//! 采样本身通过 [`StatusProbe`] 注入，监控器不关心状态从哪来。

pub mod config;
pub mod monitor;
pub mod probe;

pub use config::MonitorConfig;
pub use monitor::DeviceMonitor;
pub use probe::StatusProbe;
