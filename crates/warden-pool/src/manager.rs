use crate::config::PoolConfig;
use crate::error::Result;
use crate::factory::ConnectionFactory;
use crate::pool::DevicePool;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};
use warden_types::{DeviceConnection, PoolStatistics};

/// 连接池管理器
///
/// 每设备一个池，首次访问时在分片锁内原子创建，
/// 避免并发首借时重复建池。进程退出前由 `close_all` 统一拆除。
pub struct PoolManager {
    pools: DashMap<String, Arc<DevicePool>>,
    factory: Arc<dyn ConnectionFactory>,
    config: PoolConfig,
}

impl PoolManager {
    pub fn new(factory: Arc<dyn ConnectionFactory>, config: PoolConfig) -> Self {
        Self {
            pools: DashMap::new(),
            factory,
            config,
        }
    }

    /// 借出设备连接，设备池不存在则先建池
    pub async fn borrow(&self, device_id: &str) -> Result<DeviceConnection> {
        let pool = self.pool_for(device_id);
        pool.borrow().await
    }

    /// 归还设备连接
    ///
    /// 池已被拆除时不得重建：游离连接直接经工厂销毁。
    pub async fn give_back(&self, device_id: &str, conn: DeviceConnection) {
        match self.existing_pool(device_id) {
            Some(pool) => pool.give_back(conn).await,
            None => {
                debug!(
                    device_id = %device_id,
                    connection_id = %conn.connection_id,
                    "Pool gone, destroying returned connection"
                );
                self.factory.destroy(conn).await;
            }
        }
    }

    /// 作废一条借出的连接
    pub async fn invalidate(&self, device_id: &str, conn: DeviceConnection) {
        match self.existing_pool(device_id) {
            Some(pool) => pool.invalidate(conn).await,
            None => self.factory.destroy(conn).await,
        }
    }

    /// 关闭并移除单个设备的池
    pub async fn close_pool(&self, device_id: &str) {
        if let Some((_, pool)) = self.pools.remove(device_id) {
            pool.close().await;
            debug!(device_id = %device_id, "Device pool removed");
        }
    }

    /// 关闭全部池
    pub async fn close_all(&self) {
        let device_ids: Vec<String> = self.pools.iter().map(|e| e.key().clone()).collect();
        let count = device_ids.len();
        for device_id in device_ids {
            if let Some((_, pool)) = self.pools.remove(&device_id) {
                pool.close().await;
            }
        }
        info!(pool_count = %count, "All device pools closed");
    }

    /// 设备池统计快照，池不存在返回 None
    pub async fn statistics(&self, device_id: &str) -> Option<PoolStatistics> {
        let pool = self.pools.get(device_id)?.clone();
        Some(pool.statistics().await)
    }

    /// 当前管理的池数量
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// 取已存在的设备池，不创建
    fn existing_pool(&self, device_id: &str) -> Option<Arc<DevicePool>> {
        self.pools.get(device_id).map(|entry| entry.clone())
    }

    /// 取出或原子创建设备池
    fn pool_for(&self, device_id: &str) -> Arc<DevicePool> {
        self.pools
            .entry(device_id.to_string())
            .or_insert_with(|| {
                debug!(device_id = %device_id, "Creating device pool");
                Arc::new(DevicePool::new(
                    device_id,
                    self.config.clone(),
                    self.factory.clone(),
                ))
            })
            .clone()
    }
}
