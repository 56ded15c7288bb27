use std::sync::Arc;

use dashmap::DashMap;
use tracing::{info, warn};
use warden_types::{DeviceInfo, VideoStreamDescriptor};

use crate::adapter::{HttpAdapter, RtmpAdapter, RtspAdapter, StreamAdapter};
use crate::error::{Result, VideoError};

/// 适配器注册表
///
/// 选择规则：在所有声明支持设备的适配器中取优先级最高者，
/// 优先级相同取先注册的那个。注册顺序固定，选择结果可复现。
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn StreamAdapter>>,
    /// stream_id -> 描述符
    active: DashMap<String, VideoStreamDescriptor>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
            active: DashMap::new(),
        }
    }

    /// 内置三类适配器，按 RTSP > RTMP > HTTP 注册
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RtspAdapter::new()));
        registry.register(Arc::new(RtmpAdapter::new()));
        registry.register(Arc::new(HttpAdapter::new()));
        registry
    }

    pub fn register(&mut self, adapter: Arc<dyn StreamAdapter>) {
        info!(
            adapter = %adapter.name(),
            priority = adapter.priority(),
            "stream adapter registered"
        );
        self.adapters.push(adapter);
    }

    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    /// 为设备选择适配器
    ///
    /// 严格大于才替换当前候选，平分时保留先注册者。
    pub fn select(&self, device: &DeviceInfo) -> Result<Arc<dyn StreamAdapter>> {
        let mut best: Option<&Arc<dyn StreamAdapter>> = None;
        for adapter in &self.adapters {
            if !adapter.supports(device) {
                continue;
            }
            match best {
                Some(current) if adapter.priority() > current.priority() => {
                    best = Some(adapter);
                }
                None => best = Some(adapter),
                _ => {}
            }
        }
        best.cloned().ok_or_else(|| VideoError::NoAdapterAvailable {
            device_id: device.device_id.clone(),
        })
    }

    /// 建流并记入活跃流表
    pub fn create_stream(&self, device: &DeviceInfo) -> Result<VideoStreamDescriptor> {
        let adapter = self.select(device)?;
        let descriptor = adapter.create_stream(device)?;
        info!(
            device_id = %device.device_id,
            stream_id = %descriptor.stream_id,
            adapter = %adapter.name(),
            url = %descriptor.stream_url,
            "stream created"
        );
        self.active
            .insert(descriptor.stream_id.clone(), descriptor.clone());
        Ok(descriptor)
    }

    /// 停流，从活跃流表移除并通知所属适配器
    pub fn stop_stream(&self, stream_id: &str) -> Result<()> {
        let (_, descriptor) = self
            .active
            .remove(stream_id)
            .ok_or_else(|| VideoError::StreamNotFound(stream_id.to_string()))?;
        match self
            .adapters
            .iter()
            .find(|a| a.protocol() == descriptor.protocol)
        {
            Some(adapter) => adapter.stop_stream(stream_id),
            None => warn!(stream_id = %stream_id, "no adapter for active stream protocol"),
        }
        Ok(())
    }

    pub fn active_stream(&self, stream_id: &str) -> Option<VideoStreamDescriptor> {
        self.active.get(stream_id).map(|d| d.clone())
    }

    pub fn active_stream_count(&self) -> usize {
        self.active.len()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_types::{DeviceKind, ProtocolType, StreamProtocol};

    fn camera(device_id: &str) -> DeviceInfo {
        DeviceInfo::new(
            device_id,
            "hikvision",
            "DS-2CD2T47",
            DeviceKind::Camera,
            ProtocolType::Rtsp,
            "192.168.1.64",
            554,
        )
    }

    /// 优先级 100 的优先于 90 和 80 的一员
    struct FixedAdapter {
        name: &'static str,
        priority: i32,
        protocol: StreamProtocol,
    }

    impl StreamAdapter for FixedAdapter {
        fn name(&self) -> &str {
            self.name
        }
        fn protocol(&self) -> StreamProtocol {
            self.protocol
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn supports(&self, _device: &DeviceInfo) -> bool {
            true
        }
        fn create_stream(&self, device: &DeviceInfo) -> Result<VideoStreamDescriptor> {
            Ok(VideoStreamDescriptor {
                device_id: device.device_id.clone(),
                stream_id: format!("stream_{}", self.name),
                stream_url: format!("{}://fixed", self.protocol.as_str()),
                protocol: self.protocol,
                width: 0,
                height: 0,
                frame_rate: 0,
                bitrate: 0,
            })
        }
    }

    #[test]
    fn test_rtsp_wins_when_all_support() {
        let registry = AdapterRegistry::with_defaults();
        let adapter = registry.select(&camera("cam_001")).unwrap();
        assert_eq!(adapter.name(), "rtsp");
        assert_eq!(adapter.priority(), 100);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let registry = AdapterRegistry::with_defaults();
        let device = camera("cam_002");
        for _ in 0..10 {
            assert_eq!(registry.select(&device).unwrap().name(), "rtsp");
        }
    }

    #[test]
    fn test_tie_break_keeps_first_registered() {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(FixedAdapter {
            name: "first",
            priority: 50,
            protocol: StreamProtocol::Rtmp,
        }));
        registry.register(Arc::new(FixedAdapter {
            name: "second",
            priority: 50,
            protocol: StreamProtocol::Http,
        }));
        assert_eq!(registry.select(&camera("cam_003")).unwrap().name(), "first");
    }

    #[test]
    fn test_no_adapter_available() {
        let registry = AdapterRegistry::with_defaults();
        let mut device = camera("dev_004");
        device.kind = DeviceKind::AccessController;
        assert!(matches!(
            registry.select(&device),
            Err(VideoError::NoAdapterAvailable { .. })
        ));
    }

    #[test]
    fn test_create_and_stop_stream() {
        let registry = AdapterRegistry::with_defaults();
        let descriptor = registry.create_stream(&camera("cam_005")).unwrap();
        assert_eq!(descriptor.protocol, StreamProtocol::Rtsp);
        assert_eq!(registry.active_stream_count(), 1);
        assert!(registry.active_stream(&descriptor.stream_id).is_some());

        registry.stop_stream(&descriptor.stream_id).unwrap();
        assert_eq!(registry.active_stream_count(), 0);
        assert!(matches!(
            registry.stop_stream(&descriptor.stream_id),
            Err(VideoError::StreamNotFound(_))
        ));
    }
}
