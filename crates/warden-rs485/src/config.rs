use serde::{Deserialize, Serialize};

/// RS485 协议配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Rs485Config {
    /// 心跳响应窗口（毫秒），窗口内无响应记一次超时
    pub heartbeat_window_ms: u64,

    /// 窗口扫描周期（毫秒）
    pub heartbeat_sweep_interval_ms: u64,

    /// 连续超时多少次后判定断连
    pub max_consecutive_timeouts: u32,
}

impl Default for Rs485Config {
    fn default() -> Self {
        Self {
            heartbeat_window_ms: 60_000,
            heartbeat_sweep_interval_ms: 10_000,
            max_consecutive_timeouts: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Rs485Config::default();
        assert_eq!(config.heartbeat_window_ms, 60_000);
        assert_eq!(config.heartbeat_sweep_interval_ms, 10_000);
        assert_eq!(config.max_consecutive_timeouts, 3);
    }
}
