use serde::{Deserialize, Serialize};

/// 监控配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// 轮询间隔（毫秒）
    pub polling_interval_ms: u64,

    /// 判定问题设备时检查的最近快照条数
    pub recent_window: usize,

    /// 最近窗口内带错误标记的快照达到该数量即判定为问题设备
    pub problematic_threshold: usize,

    /// 每设备历史环容量，写满后丢弃最旧的
    pub history_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            polling_interval_ms: 30_000,
            recent_window: 5,
            problematic_threshold: 3,
            history_capacity: 20,
        }
    }
}
