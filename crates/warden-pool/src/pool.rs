use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::factory::ConnectionFactory;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use warden_types::{DeviceConnection, PoolStatistics};

/// 单设备有界连接池
///
/// 连接状态机：created → idle ⇄ active → (valid|invalid) → destroyed。
/// 信号量许可限制并发借出不超过 `max_total`；
/// 新连接只在空闲链表取不到有效连接时创建，
/// 因此存活连接数也不会超过 `max_total`。
pub struct DevicePool {
    device_id: String,
    config: PoolConfig,
    factory: Arc<dyn ConnectionFactory>,
    semaphore: Arc<Semaphore>,
    idle: Mutex<VecDeque<DeviceConnection>>,
    /// 存活连接数（idle + active）
    live: AtomicUsize,
    /// 已借出连接数
    active: AtomicUsize,
    closed: AtomicBool,
}

impl DevicePool {
    pub fn new(
        device_id: impl Into<String>,
        config: PoolConfig,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Self {
        let max_total = config.max_total.max(1);
        Self {
            device_id: device_id.into(),
            config,
            factory,
            semaphore: Arc::new(Semaphore::new(max_total)),
            idle: Mutex::new(VecDeque::new()),
            live: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// 借出一条连接
    ///
    /// 最多等待 `max_wait_millis`；空闲连接先校验，失效的销毁补建。
    pub async fn borrow(&self) -> Result<DeviceConnection> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PoolError::PoolClosed(self.device_id.clone()));
        }

        let wait = Duration::from_millis(self.config.max_wait_millis);
        let permit = match timeout(wait, self.semaphore.acquire()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(PoolError::PoolClosed(self.device_id.clone())),
            Err(_) => {
                warn!(
                    device_id = %self.device_id,
                    waited_ms = %self.config.max_wait_millis,
                    "Connection acquisition timed out"
                );
                return Err(PoolError::AcquisitionTimeout {
                    device_id: self.device_id.clone(),
                    waited_ms: self.config.max_wait_millis,
                });
            }
        };
        // 许可随连接借出，归还/销毁时补回
        permit.forget();

        // 先复用空闲连接，借出前逐条校验
        loop {
            let candidate = {
                let mut idle = self.idle.lock().await;
                idle.pop_front()
            };

            match candidate {
                Some(conn) if self.factory.validate(&conn) => {
                    self.active.fetch_add(1, Ordering::AcqRel);
                    debug!(
                        device_id = %self.device_id,
                        connection_id = %conn.connection_id,
                        "Idle connection reused"
                    );
                    return Ok(conn);
                }
                Some(conn) => {
                    debug!(
                        device_id = %self.device_id,
                        connection_id = %conn.connection_id,
                        age_ms = %conn.age_millis(),
                        "Evicting stale connection"
                    );
                    self.factory.destroy(conn).await;
                    self.live.fetch_sub(1, Ordering::AcqRel);
                }
                None => break,
            }
        }

        // 空闲链表耗尽，按需创建；存活槽位先占后建
        loop {
            if self.reserve_live_slot() {
                break;
            }
            // 槽位被并发补建占走，对应连接很快会出现在空闲链表
            tokio::task::yield_now().await;
            let recovered = {
                let mut idle = self.idle.lock().await;
                idle.pop_front()
            };
            if let Some(conn) = recovered {
                if self.factory.validate(&conn) {
                    self.active.fetch_add(1, Ordering::AcqRel);
                    return Ok(conn);
                }
                self.factory.destroy(conn).await;
                self.live.fetch_sub(1, Ordering::AcqRel);
            }
        }

        match self.factory.create(&self.device_id).await {
            Ok(conn) => {
                self.active.fetch_add(1, Ordering::AcqRel);
                Ok(conn)
            }
            Err(e) => {
                self.live.fetch_sub(1, Ordering::AcqRel);
                self.semaphore.add_permits(1);
                Err(e)
            }
        }
    }

    /// 原子占一个存活槽位，`live` 永不超过 `max_total`
    fn reserve_live_slot(&self) -> bool {
        self.live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                (live < self.config.max_total).then_some(live + 1)
            })
            .is_ok()
    }

    /// 归还连接
    ///
    /// 有效且空闲未满则入链表复用，否则销毁；
    /// 归还后空闲不足 `min_idle` 时顺带补建。
    pub async fn give_back(&self, conn: DeviceConnection) {
        self.active.fetch_sub(1, Ordering::AcqRel);

        let keep = !self.closed.load(Ordering::Acquire) && self.factory.validate(&conn);
        if keep {
            let mut idle = self.idle.lock().await;
            if idle.len() < self.config.max_idle {
                idle.push_back(conn);
                drop(idle);
                self.semaphore.add_permits(1);
                self.top_up_min_idle().await;
                return;
            }
        }

        self.factory.destroy(conn).await;
        self.live.fetch_sub(1, Ordering::AcqRel);
        self.semaphore.add_permits(1);
        self.top_up_min_idle().await;
    }

    /// 显式作废一条借出的连接
    pub async fn invalidate(&self, conn: DeviceConnection) {
        self.active.fetch_sub(1, Ordering::AcqRel);
        self.factory.destroy(conn).await;
        self.live.fetch_sub(1, Ordering::AcqRel);
        self.semaphore.add_permits(1);
    }

    /// 关闭池，销毁全部空闲连接
    ///
    /// 仍在外的连接由归还路径销毁。
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.semaphore.close();

        let drained: Vec<DeviceConnection> = {
            let mut idle = self.idle.lock().await;
            idle.drain(..).collect()
        };
        let count = drained.len();
        for conn in drained {
            self.factory.destroy(conn).await;
            self.live.fetch_sub(1, Ordering::AcqRel);
        }

        info!(
            device_id = %self.device_id,
            destroyed_idle = %count,
            "Pool closed"
        );
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// 当前统计快照
    pub async fn statistics(&self) -> PoolStatistics {
        let idle = self.idle.lock().await.len();
        PoolStatistics {
            device_id: self.device_id.clone(),
            active: self.active.load(Ordering::Acquire),
            idle,
            max_total: self.config.max_total,
            max_idle: self.config.max_idle,
            min_idle: self.config.min_idle,
        }
    }

    /// 归还后顺带把空闲补到 `min_idle`
    ///
    /// 建连前先占存活槽位，并发归还各自补建也不会越过 `max_total`；
    /// 入链表前重查 `max_idle`，占位失败即回滚。
    async fn top_up_min_idle(&self) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        loop {
            {
                let idle = self.idle.lock().await;
                if idle.len() >= self.config.min_idle {
                    return;
                }
            }
            if !self.reserve_live_slot() {
                return;
            }
            match self.factory.create(&self.device_id).await {
                Ok(conn) => {
                    let mut idle = self.idle.lock().await;
                    if self.closed.load(Ordering::Acquire) || idle.len() >= self.config.max_idle {
                        drop(idle);
                        self.factory.destroy(conn).await;
                        self.live.fetch_sub(1, Ordering::AcqRel);
                        return;
                    }
                    idle.push_back(conn);
                }
                Err(e) => {
                    self.live.fetch_sub(1, Ordering::AcqRel);
                    warn!(
                        device_id = %self.device_id,
                        error = %e,
                        "Failed to top up idle connections"
                    );
                    return;
                }
            }
        }
    }
}
