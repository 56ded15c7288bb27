use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 设备状态快照
///
/// 一次采样产生的不可变记录，追加进每设备的有界历史环。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStatusSnapshot {
    pub device_id: String,

    pub timestamp: DateTime<Utc>,

    /// 指标键值（online、pool_active、latency_ms 等）
    pub metrics: HashMap<String, serde_json::Value>,
}

impl DeviceStatusSnapshot {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp: Utc::now(),
            metrics: HashMap::new(),
        }
    }

    pub fn with_metric(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }

    /// 快照是否带有错误/超时标记
    pub fn has_error_marker(&self) -> bool {
        self.metrics
            .get("error")
            .or_else(|| self.metrics.get("timeout"))
            .map(|v| v.as_bool().unwrap_or(true))
            .unwrap_or(false)
    }
}
