use async_trait::async_trait;
use warden_types::DeviceStatusSnapshot;

/// 状态采样探针
///
/// 由池层/协议层各自实现并在网关处组合。采样不抛错：
/// 探测失败的设备返回带 `error` 标记的快照，监控器据此统计。
#[async_trait]
pub trait StatusProbe: Send + Sync {
    async fn probe(&self, device_id: &str) -> DeviceStatusSnapshot;
}
