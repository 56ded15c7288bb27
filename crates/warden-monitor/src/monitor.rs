use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::{DashMap, DashSet};
use tokio::sync::RwLock;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::interval;
use tracing::{debug, info, warn};
use warden_types::DeviceStatusSnapshot;

use crate::config::MonitorConfig;
use crate::probe::StatusProbe;

/// 设备监控器
///
/// 维护每设备的有界快照历史；既支持按需采样，
/// 也支持对一组设备的周期轮询，停止信号在轮询周期之间协作检查。
pub struct DeviceMonitor {
    probe: Arc<dyn StatusProbe>,

    config: MonitorConfig,

    /// 设备ID -> 快照历史，新的追加在尾部
    history: Arc<DashMap<String, VecDeque<DeviceStatusSnapshot>>>,

    /// 周期轮询覆盖的设备集合
    monitored: Arc<DashSet<String>>,

    /// 轮询任务是否在运行
    running: Arc<RwLock<bool>>,

    /// 轮询任务世代号；shutdown 递增后旧任务在下一个 tick 退出，
    /// 重启时不会残留两个轮询循环
    generation: Arc<AtomicU64>,
}

impl DeviceMonitor {
    pub fn new(probe: Arc<dyn StatusProbe>, config: MonitorConfig) -> Self {
        Self {
            probe,
            config,
            history: Arc::new(DashMap::new()),
            monitored: Arc::new(DashSet::new()),
            running: Arc::new(RwLock::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 立即采样一次并记入历史
    pub async fn get_realtime_status(&self, device_id: &str) -> DeviceStatusSnapshot {
        let snapshot = self.probe.probe(device_id).await;
        Self::record(&self.history, self.config.history_capacity, snapshot.clone());
        debug!(device_id = %device_id, "realtime status sampled");
        snapshot
    }

    /// 异步采样，返回句柄由调用方等待
    pub fn monitor_async(&self, device_id: &str) -> JoinHandle<DeviceStatusSnapshot> {
        let probe = self.probe.clone();
        let history = self.history.clone();
        let capacity = self.config.history_capacity;
        let device_id = device_id.to_string();
        tokio::spawn(async move {
            let snapshot = probe.probe(&device_id).await;
            Self::record(&history, capacity, snapshot.clone());
            snapshot
        })
    }

    /// 并发采样一批设备
    pub async fn batch_monitor(
        &self,
        device_ids: &[String],
    ) -> HashMap<String, DeviceStatusSnapshot> {
        let mut tasks = JoinSet::new();
        for device_id in device_ids {
            let probe = self.probe.clone();
            let device_id = device_id.clone();
            tasks.spawn(async move {
                let snapshot = probe.probe(&device_id).await;
                (device_id, snapshot)
            });
        }

        let mut results = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((device_id, snapshot)) => {
                    Self::record(&self.history, self.config.history_capacity, snapshot.clone());
                    results.insert(device_id, snapshot);
                }
                Err(e) => warn!(error = %e, "batch monitor task failed"),
            }
        }
        results
    }

    /// 取最近 `count` 条快照，新的在前
    pub fn get_status_history(&self, device_id: &str, count: usize) -> Vec<DeviceStatusSnapshot> {
        match self.history.get(device_id) {
            Some(ring) => ring.iter().rev().take(count).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// 最近窗口内错误标记达到阈值的设备
    pub fn get_problematic_devices(&self) -> Vec<String> {
        let mut problematic = Vec::new();
        for entry in self.history.iter() {
            let errors = entry
                .value()
                .iter()
                .rev()
                .take(self.config.recent_window)
                .filter(|s| s.has_error_marker())
                .count();
            if errors >= self.config.problematic_threshold {
                problematic.push(entry.key().clone());
            }
        }
        problematic.sort();
        problematic
    }

    /// 聚合统计：设备数、快照数、问题设备、每设备错误率
    pub fn get_performance_statistics(&self) -> serde_json::Value {
        let mut per_device = serde_json::Map::new();
        let mut total_snapshots = 0usize;
        for entry in self.history.iter() {
            let total = entry.value().len();
            let errors = entry.value().iter().filter(|s| s.has_error_marker()).count();
            total_snapshots += total;
            per_device.insert(
                entry.key().clone(),
                serde_json::json!({
                    "snapshots": total,
                    "errors": errors,
                    "error_rate": if total > 0 { errors as f64 / total as f64 } else { 0.0 },
                }),
            );
        }
        serde_json::json!({
            "device_count": self.history.len(),
            "monitored_count": self.monitored.len(),
            "total_snapshots": total_snapshots,
            "problematic_devices": self.get_problematic_devices(),
            "devices": per_device,
        })
    }

    /// 把设备加入周期轮询；轮询任务未启动则先启动
    pub async fn start_monitoring(&self, device_ids: &[String]) {
        for device_id in device_ids {
            self.monitored.insert(device_id.clone());
        }
        info!(count = device_ids.len(), "devices added to monitoring set");
        self.ensure_polling_task().await;
    }

    /// 把设备移出周期轮询，在下一个轮询周期生效
    pub fn stop_monitoring(&self, device_ids: &[String]) {
        for device_id in device_ids {
            self.monitored.remove(device_id);
        }
        info!(count = device_ids.len(), "devices removed from monitoring set");
    }

    /// 停止轮询任务
    pub async fn shutdown(&self) {
        let mut running = self.running.write().await;
        *running = false;
        // 递增世代号，旧任务即使在重启把 running 置回 true 之后才醒来也会退出
        self.generation.fetch_add(1, Ordering::AcqRel);
        info!("device monitor stopping...");
    }

    async fn ensure_polling_task(&self) {
        let mut running = self.running.write().await;
        if *running {
            return;
        }
        *running = true;
        let my_gen = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        drop(running);

        info!(
            polling_interval_ms = self.config.polling_interval_ms,
            "device monitor polling started"
        );

        let probe = self.probe.clone();
        let history = self.history.clone();
        let monitored = self.monitored.clone();
        let running = self.running.clone();
        let generation = self.generation.clone();
        let capacity = self.config.history_capacity;
        let period = Duration::from_millis(self.config.polling_interval_ms);

        tokio::spawn(async move {
            let mut ticker = interval(period);
            // 首个 tick 立即完成，跳过它让第一轮采样等满一个周期
            ticker.tick().await;

            loop {
                ticker.tick().await;

                if generation.load(Ordering::Acquire) != my_gen || !*running.read().await {
                    info!("device monitor polling stopped");
                    break;
                }

                let ids: Vec<String> = monitored.iter().map(|e| e.key().clone()).collect();
                for device_id in ids {
                    let snapshot = probe.probe(&device_id).await;
                    Self::record(&history, capacity, snapshot);
                }
            }
        });
    }

    fn record(
        history: &DashMap<String, VecDeque<DeviceStatusSnapshot>>,
        capacity: usize,
        snapshot: DeviceStatusSnapshot,
    ) {
        let mut ring = history
            .entry(snapshot.device_id.clone())
            .or_insert_with(VecDeque::new);
        ring.push_back(snapshot);
        while ring.len() > capacity {
            ring.pop_front();
        }
    }
}
