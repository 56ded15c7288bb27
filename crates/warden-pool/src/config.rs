use serde::{Deserialize, Serialize};

/// 连接池配置（按部署生效，不随调用变化）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// 单设备存活连接上限
    pub max_total: usize,

    /// 空闲连接上限
    pub max_idle: usize,

    /// 归还时维持的空闲下限
    pub min_idle: usize,

    /// 借出等待上限（毫秒）
    pub max_wait_millis: u64,

    /// 连接最大存活时长（毫秒），超龄即淘汰
    pub connection_max_age_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_total: 50,
            max_idle: 10,
            min_idle: 2,
            max_wait_millis: 5000,
            connection_max_age_ms: 3_600_000,
        }
    }
}
