use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 传输协议类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolType {
    Rs485,
    Rtsp,
    Rtmp,
    Http,
    Tcp,
}

impl ProtocolType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "rs485" | "rs-485" => Some(Self::Rs485),
            "rtsp" => Some(Self::Rtsp),
            "rtmp" => Some(Self::Rtmp),
            "http" | "https" | "hls" => Some(Self::Http),
            "tcp" | "ip" => Some(Self::Tcp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rs485 => "rs485",
            Self::Rtsp => "rtsp",
            Self::Rtmp => "rtmp",
            Self::Http => "http",
            Self::Tcp => "tcp",
        }
    }
}

/// 设备类别
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    /// 门禁控制器
    AccessController,
    /// 生物识别终端
    Biometric,
    /// 摄像头
    Camera,
    /// 工业传感器/仪表
    Industrial,
    /// 自定义类别
    Custom(String),
}

impl DeviceKind {
    pub fn as_str(&self) -> &str {
        match self {
            DeviceKind::AccessController => "AccessController",
            DeviceKind::Biometric => "Biometric",
            DeviceKind::Camera => "Camera",
            DeviceKind::Industrial => "Industrial",
            DeviceKind::Custom(s) => s.as_str(),
        }
    }
}

/// 静态目录中的设备描述
///
/// 由外部设备注册服务下发，网关只读使用。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_id: String,
    pub vendor: String,
    pub model: String,
    pub kind: DeviceKind,
    pub protocol: ProtocolType,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// 视频通道号等扩展参数
    pub params: HashMap<String, String>,
}

impl DeviceInfo {
    pub fn new(
        device_id: impl Into<String>,
        vendor: impl Into<String>,
        model: impl Into<String>,
        kind: DeviceKind,
        protocol: ProtocolType,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            vendor: vendor.into(),
            model: model.into(),
            kind,
            protocol,
            host: host.into(),
            port,
            username: None,
            password: None,
            params: HashMap::new(),
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// 厂商目录条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorInfo {
    pub vendor: String,
    /// 该厂商受支持的设备型号
    pub models: Vec<String>,
    pub protocol: ProtocolType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_type_from_str() {
        assert_eq!(ProtocolType::from_str("rs485"), Some(ProtocolType::Rs485));
        assert_eq!(ProtocolType::from_str("RS-485"), Some(ProtocolType::Rs485));
        assert_eq!(ProtocolType::from_str("rtsp"), Some(ProtocolType::Rtsp));
        assert_eq!(ProtocolType::from_str("hls"), Some(ProtocolType::Http));
        assert_eq!(ProtocolType::from_str("modbus"), None);
    }

    #[test]
    fn test_device_info_builder() {
        let info = DeviceInfo::new(
            "dev_001",
            "hikvision",
            "DS-2CD2T47",
            DeviceKind::Camera,
            ProtocolType::Rtsp,
            "192.168.1.64",
            554,
        )
        .with_credentials("admin", "secret")
        .with_param("channel", "1");

        assert_eq!(info.username.as_deref(), Some("admin"));
        assert_eq!(info.params.get("channel").map(String::as_str), Some("1"));
    }
}
