use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 设备指令请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    /// 目标设备 ID
    pub device_id: String,

    /// 指令类型
    pub command_type: String,

    /// 指令载荷（不透明字节）
    pub command_data: Vec<u8>,
}

impl CommandRequest {
    pub fn new(
        device_id: impl Into<String>,
        command_type: impl Into<String>,
        command_data: Vec<u8>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            command_type: command_type.into(),
            command_data,
        }
    }
}

/// 设备指令结果
///
/// 管道边界上的统一返回值：设备级失败以值的形式携带，
/// 不会作为错误跨层抛出。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,

    pub message: String,

    /// 业务数据
    pub data: Option<Value>,

    /// 失败分类码（成功时为 None）
    pub error_code: Option<String>,

    /// 结果产生时间
    pub finished_at: DateTime<Utc>,
}

impl CommandResult {
    /// 成功结果
    pub fn ok(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            error_code: None,
            finished_at: Utc::now(),
        }
    }

    /// 失败结果
    pub fn failure(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error_code: Some(error_code.into()),
            finished_at: Utc::now(),
        }
    }

    pub fn is_failure(&self) -> bool {
        !self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_tagging() {
        let ok = CommandResult::ok("done", Some(serde_json::json!({"value": 1})));
        assert!(ok.success);
        assert!(ok.error_code.is_none());

        let fail = CommandResult::failure("TRANSPORT_ERROR", "send failed");
        assert!(fail.is_failure());
        assert_eq!(fail.error_code.as_deref(), Some("TRANSPORT_ERROR"));
    }
}
