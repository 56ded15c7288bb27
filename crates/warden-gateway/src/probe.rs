use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use warden_monitor::StatusProbe;
use warden_pool::PoolManager;
use warden_rs485::{Rs485ProtocolService, SessionState};
use warden_types::DeviceStatusSnapshot;

/// 网关状态探针
///
/// 汇集池层统计和 RS485 会话状态采成一条快照。
/// 会话断连或心跳超时时打上错误/超时标记，供问题设备判定使用。
pub struct GatewayStatusProbe {
    pool: Arc<PoolManager>,
    rs485: Arc<Rs485ProtocolService>,
}

impl GatewayStatusProbe {
    pub fn new(pool: Arc<PoolManager>, rs485: Arc<Rs485ProtocolService>) -> Self {
        Self { pool, rs485 }
    }
}

#[async_trait]
impl StatusProbe for GatewayStatusProbe {
    async fn probe(&self, device_id: &str) -> DeviceStatusSnapshot {
        let status = self.rs485.get_device_status(device_id);
        let mut snapshot = DeviceStatusSnapshot::new(device_id)
            .with_metric("online", json!(status.online))
            .with_metric("session_state", json!(status.state.as_str()))
            .with_metric("consecutive_timeouts", json!(status.consecutive_timeouts));

        match status.state {
            SessionState::Disconnected => {
                snapshot = snapshot.with_metric("error", json!(true));
            }
            SessionState::HeartbeatTimeout => {
                snapshot = snapshot.with_metric("timeout", json!(true));
            }
            _ => {}
        }

        if let Some(stats) = self.pool.statistics(device_id).await {
            snapshot = snapshot
                .with_metric("pool_active", json!(stats.active))
                .with_metric("pool_idle", json!(stats.idle));
        }

        snapshot
    }
}
