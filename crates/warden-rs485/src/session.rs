use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 设备会话状态
///
/// `Uninitialized → Initialized → (HeartbeatOk ⇄ HeartbeatTimeout) → Disconnected`，
/// 重连回到 `Initialized`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    HeartbeatOk,
    HeartbeatTimeout,
    Disconnected,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Initialized => "INITIALIZED",
            Self::HeartbeatOk => "HEARTBEAT_OK",
            Self::HeartbeatTimeout => "HEARTBEAT_TIMEOUT",
            Self::Disconnected => "DISCONNECTED",
        }
    }

    /// 该状态下设备是否视为在线
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Initialized | Self::HeartbeatOk | Self::HeartbeatTimeout)
    }
}

/// RS485 设备会话
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rs485Session {
    pub device_id: String,
    /// 总线地址（1 字节）
    pub device_address: u8,
    pub state: SessionState,
    /// 连续心跳超时次数
    pub consecutive_timeouts: u32,
    /// 心跳帧递增序号
    pub sequence: u16,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    pub initialized_at: DateTime<Utc>,
}

impl Rs485Session {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            device_address: 0x01,
            state: SessionState::Initialized,
            consecutive_timeouts: 0,
            sequence: 0,
            last_heartbeat_at: None,
            initialized_at: Utc::now(),
        }
    }

    /// 下一个心跳序号
    pub fn next_sequence(&mut self) -> u16 {
        self.sequence = self.sequence.wrapping_add(1);
        self.sequence
    }

    /// 收到心跳响应
    pub fn record_heartbeat_ok(&mut self) {
        self.state = SessionState::HeartbeatOk;
        self.consecutive_timeouts = 0;
        self.last_heartbeat_at = Some(Utc::now());
    }

    /// 心跳窗口超时
    ///
    /// 连续超时达到阈值后进入 `Disconnected`。
    pub fn record_heartbeat_timeout(&mut self, max_consecutive: u32) {
        if self.state == SessionState::Disconnected {
            return;
        }
        self.consecutive_timeouts = self.consecutive_timeouts.saturating_add(1);
        self.state = if self.consecutive_timeouts >= max_consecutive {
            SessionState::Disconnected
        } else {
            SessionState::HeartbeatTimeout
        };
    }

    /// 重连：回到已初始化状态
    pub fn reconnect(&mut self) {
        self.state = SessionState::Initialized;
        self.consecutive_timeouts = 0;
        self.initialized_at = Utc::now();
    }

    /// 主动断开
    pub fn disconnect(&mut self) {
        self.state = SessionState::Disconnected;
    }
}
