//! 失败结果的分类码
//!
//! `CommandResult::failure` 的 `error_code` 取值，
//! 调用方据此区分可重试的瞬时故障与真实设备错误。

/// 传输层建立连接失败
pub const CONNECTION_CREATE_ERROR: &str = "CONNECTION_CREATE_ERROR";

/// 指令收发失败
pub const COMMAND_EXECUTION_FAILURE: &str = "COMMAND_EXECUTION_FAILURE";

/// 重试次数耗尽
pub const RETRY_EXHAUSTED: &str = "RETRY_EXHAUSTED";

/// 重试等待期间被中断
pub const RETRY_INTERRUPTED: &str = "RETRY_INTERRUPTED";

/// 设备离线
pub const DEVICE_OFFLINE: &str = "DEVICE_OFFLINE";
