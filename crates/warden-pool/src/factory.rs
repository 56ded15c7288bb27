use crate::error::{PoolError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};
use warden_types::DeviceConnection;

/// 连接工厂
///
/// 创建、校验、销毁单个设备的传输层连接。
/// 销毁是尽力而为的：只记录日志，不向上传播失败。
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// 为设备建立一条新连接
    async fn create(&self, device_id: &str) -> Result<DeviceConnection>;

    /// 借出时校验连接是否仍然可用
    fn validate(&self, conn: &DeviceConnection) -> bool;

    /// 销毁连接（尽力而为）
    async fn destroy(&self, conn: DeviceConnection);
}

/// 默认传输连接工厂
///
/// 连接句柄本身是不透明的，真正的传输细节由设备侧驱动承担，
/// 这里负责句柄生命周期：按存活时长做 TTL 校验。
pub struct TransportConnectionFactory {
    max_age: Duration,
}

impl TransportConnectionFactory {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }
}

impl Default for TransportConnectionFactory {
    fn default() -> Self {
        // 默认 1 小时 TTL
        Self::new(Duration::from_millis(3_600_000))
    }
}

#[async_trait]
impl ConnectionFactory for TransportConnectionFactory {
    async fn create(&self, device_id: &str) -> Result<DeviceConnection> {
        if device_id.trim().is_empty() {
            return Err(PoolError::CreateFailed {
                device_id: device_id.to_string(),
                reason: "empty device id".to_string(),
            });
        }

        let conn = DeviceConnection::new(device_id);
        debug!(
            device_id = %device_id,
            connection_id = %conn.connection_id,
            "Connection created"
        );
        Ok(conn)
    }

    fn validate(&self, conn: &DeviceConnection) -> bool {
        let age_ms = conn.age_millis();
        age_ms >= 0 && (age_ms as u128) < self.max_age.as_millis()
    }

    async fn destroy(&self, conn: DeviceConnection) {
        // 尽力而为，句柄释放不会失败，但保留日志位点
        if conn.device_id.is_empty() {
            warn!(connection_id = %conn.connection_id, "Destroying connection without device id");
        }
        debug!(
            device_id = %conn.device_id,
            connection_id = %conn.connection_id,
            age_ms = %conn.age_millis(),
            "Connection destroyed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_create_and_validate() {
        let factory = TransportConnectionFactory::default();
        let conn = factory.create("dev_001").await.unwrap();
        assert_eq!(conn.device_id, "dev_001");
        assert!(factory.validate(&conn));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_device_id() {
        let factory = TransportConnectionFactory::default();
        let result = factory.create("  ").await;
        assert!(matches!(result, Err(PoolError::CreateFailed { .. })));
    }

    #[tokio::test]
    async fn test_validate_rejects_expired_connection() {
        let factory = TransportConnectionFactory::new(Duration::from_millis(50));
        let mut conn = DeviceConnection::new("dev_001");
        conn.created_at = Utc::now() - chrono::Duration::milliseconds(100);
        assert!(!factory.validate(&conn));
    }
}
