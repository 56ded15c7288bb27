use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 设备连接
///
/// 由连接池独占管理的传输层连接句柄，
/// 同一连接不会跨设备共享。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConnection {
    /// 设备 ID
    pub device_id: String,

    /// 连接 ID（不透明句柄）
    pub connection_id: String,

    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl DeviceConnection {
    /// 创建新连接句柄
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            connection_id: format!("conn_{}", uuid::Uuid::new_v4().simple()),
            created_at: Utc::now(),
        }
    }

    /// 连接已存活时长（毫秒）
    pub fn age_millis(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.created_at)
            .num_milliseconds()
    }
}

/// 连接池统计快照
///
/// 某一时刻单个设备连接池的状态，不做持久化。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatistics {
    pub device_id: String,
    /// 已借出连接数
    pub active: usize,
    /// 空闲连接数
    pub idle: usize,
    pub max_total: usize,
    pub max_idle: usize,
    pub min_idle: usize,
}
