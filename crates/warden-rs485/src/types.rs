use crate::session::SessionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 设备初始化结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitResult {
    pub success: bool,
    pub message: String,
    pub device_id: String,
    pub serial_number: Option<String>,
    pub protocol_version: String,
    pub init_time: DateTime<Utc>,
}

impl InitResult {
    pub fn ok(device_id: impl Into<String>, serial_number: Option<String>) -> Self {
        Self {
            success: true,
            message: "device initialized".to_string(),
            device_id: device_id.into(),
            serial_number,
            protocol_version: "RS485_PHYSICAL_V1_0".to_string(),
            init_time: Utc::now(),
        }
    }

    pub fn failure(device_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            device_id: device_id.into(),
            serial_number: None,
            protocol_version: "RS485_PHYSICAL_V1_0".to_string(),
            init_time: Utc::now(),
        }
    }
}

/// 消息处理结果
///
/// 解码失败、管道失败都折叠在这里，错误码标明类别，
/// 不会以异常形式跨出服务边界。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResult {
    pub success: bool,
    pub message: String,
    pub error_code: Option<String>,
    pub device_id: String,
    pub command_type: Option<String>,
    /// 回写给设备的响应帧
    pub response_frame: Option<Vec<u8>>,
    /// 管道返回的业务数据
    pub business_data: Option<Value>,
    pub process_time: DateTime<Utc>,
}

impl ProcessResult {
    pub fn ok(
        device_id: impl Into<String>,
        command_type: impl Into<String>,
        response_frame: Vec<u8>,
        business_data: Option<Value>,
    ) -> Self {
        Self {
            success: true,
            message: "message processed".to_string(),
            error_code: None,
            device_id: device_id.into(),
            command_type: Some(command_type.into()),
            response_frame: Some(response_frame),
            business_data,
            process_time: Utc::now(),
        }
    }

    pub fn failure(
        device_id: impl Into<String>,
        error_code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            error_code: Some(error_code.into()),
            device_id: device_id.into(),
            command_type: None,
            response_frame: None,
            business_data: None,
            process_time: Utc::now(),
        }
    }
}

/// 心跳结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatResult {
    pub success: bool,
    pub message: String,
    pub device_id: String,
    pub online: bool,
    pub sequence: u16,
    pub heartbeat_time: DateTime<Utc>,
}

/// 设备状态查询结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub device_id: String,
    pub state: SessionState,
    pub online: bool,
    pub consecutive_timeouts: u32,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    pub check_time: DateTime<Utc>,
}
