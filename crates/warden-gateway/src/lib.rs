//! 设备通信网关门面
//!
//! 启动时一次性完成装配：连接工厂 → 每设备连接池 → 指令管道
//! （基础执行 → 重试 → 日志）→ RS485 协议服务，旁挂视频适配器
//! 注册表和设备监控器。业务调用方只面对这一个门面。

pub mod probe;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use warden_config::GatewayConfig;
use warden_monitor::DeviceMonitor;
use warden_pipeline::{build_pipeline, CommandExecutor, DeviceTransport, TransportExecutor};
use warden_pool::{PoolManager, TransportConnectionFactory};
use warden_rs485::types::{DeviceStatus, HeartbeatResult, InitResult, ProcessResult};
use warden_rs485::Rs485ProtocolService;
use warden_types::{
    CommandRequest, CommandResult, DeviceInfo, DeviceStatusSnapshot, PoolStatistics,
    VideoStreamDescriptor,
};
use warden_video::AdapterRegistry;

pub use probe::GatewayStatusProbe;

/// 设备通信网关
pub struct DeviceCommGateway {
    pool: Arc<PoolManager>,
    pipeline: Arc<dyn CommandExecutor>,
    rs485: Arc<Rs485ProtocolService>,
    video: Arc<AdapterRegistry>,
    monitor: Arc<DeviceMonitor>,
    /// 心跳窗口扫描周期
    sweep_interval: Duration,
    /// 置 true 后在途重试与扫描任务立即退出
    cancel_tx: watch::Sender<bool>,
}

impl DeviceCommGateway {
    /// 按配置装配整个网关，传输实现由调用方注入
    pub fn new(config: GatewayConfig, transport: Arc<dyn DeviceTransport>) -> Self {
        let factory = Arc::new(TransportConnectionFactory::new(Duration::from_millis(
            config.pool.connection_max_age_ms,
        )));
        let pool = Arc::new(PoolManager::new(factory, config.pool.clone()));

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let basic = Arc::new(TransportExecutor::new(pool.clone(), transport));
        let pipeline = build_pipeline(basic, config.retry.clone(), Some(cancel_rx));

        let sweep_interval = Duration::from_millis(config.rs485.heartbeat_sweep_interval_ms);
        let rs485 = Arc::new(Rs485ProtocolService::new(
            pipeline.clone(),
            config.rs485.clone(),
        ));
        let video = Arc::new(AdapterRegistry::with_defaults());

        let probe = Arc::new(GatewayStatusProbe::new(pool.clone(), rs485.clone()));
        let monitor = Arc::new(DeviceMonitor::new(probe, config.monitor.clone()));

        info!("device communication gateway assembled");

        Self {
            pool,
            pipeline,
            rs485,
            video,
            monitor,
            sweep_interval,
            cancel_tx,
        }
    }

    /// 启动心跳窗口扫描
    ///
    /// 按 `heartbeat_sweep_interval_ms` 周期扫描全部会话，
    /// 沉默设备随窗口流逝走完 `HeartbeatTimeout → Disconnected`；
    /// `shutdown` 的取消信号令任务退出。
    pub fn start_heartbeat_monitoring(&self) -> tokio::task::JoinHandle<()> {
        let rs485 = self.rs485.clone();
        let mut cancel = self.cancel_tx.subscribe();
        let period = self.sweep_interval;
        info!(sweep_interval_ms = %period.as_millis(), "heartbeat window sweep started");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // 首个 tick 立即完成，跳过它
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => rs485.check_heartbeat_windows(),
                    changed = cancel.changed() => {
                        if changed.is_err() || *cancel.borrow() {
                            info!("heartbeat window sweep stopped");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// 经完整管道执行一条指令
    pub async fn execute_command(
        &self,
        request: &CommandRequest,
    ) -> warden_pipeline::Result<CommandResult> {
        self.pipeline.execute(request).await
    }

    /// 初始化 RS485 设备会话
    pub fn initialize_device(&self, device_id: &str, device_info: &DeviceInfo) -> InitResult {
        self.rs485.initialize_device(device_id, device_info)
    }

    /// 处理设备上行字节
    pub async fn process_device_message(
        &self,
        device_id: &str,
        payload: &[u8],
        protocol_type: &str,
    ) -> ProcessResult {
        self.rs485
            .process_device_message(device_id, payload, protocol_type)
            .await
    }

    /// 向设备下发心跳
    pub async fn send_heartbeat(&self, device_id: &str) -> HeartbeatResult {
        self.rs485.send_heartbeat(device_id).await
    }

    /// 扫描所有会话的心跳窗口
    pub fn check_heartbeat_windows(&self) {
        self.rs485.check_heartbeat_windows();
    }

    pub fn device_status(&self, device_id: &str) -> DeviceStatus {
        self.rs485.get_device_status(device_id)
    }

    /// 为摄像头建流
    pub fn create_stream(&self, device: &DeviceInfo) -> warden_video::Result<VideoStreamDescriptor> {
        self.video.create_stream(device)
    }

    pub fn stop_stream(&self, stream_id: &str) -> warden_video::Result<()> {
        self.video.stop_stream(stream_id)
    }

    pub async fn pool_statistics(&self, device_id: &str) -> Option<PoolStatistics> {
        self.pool.statistics(device_id).await
    }

    pub async fn realtime_status(&self, device_id: &str) -> DeviceStatusSnapshot {
        self.monitor.get_realtime_status(device_id).await
    }

    pub fn monitor(&self) -> &Arc<DeviceMonitor> {
        &self.monitor
    }

    pub fn rs485(&self) -> &Arc<Rs485ProtocolService> {
        &self.rs485
    }

    /// 网关级性能统计
    pub fn performance_statistics(&self) -> serde_json::Value {
        serde_json::json!({
            "rs485": self.rs485.performance_statistics(),
            "monitor": self.monitor.get_performance_statistics(),
            "pool_count": self.pool.pool_count(),
            "active_streams": self.video.active_stream_count(),
        })
    }

    /// 有序停机：打断在途重试，停监控，拆掉全部连接池
    pub async fn shutdown(&self) {
        info!("gateway shutting down");
        let _ = self.cancel_tx.send(true);
        self.monitor.shutdown().await;
        self.pool.close_all().await;
    }
}
