use crate::catalog;
use crate::codec::{
    self, command_type_for, decode_heartbeat, encode_heartbeat, Rs485Frame,
};
use crate::config::Rs485Config;
use crate::session::{Rs485Session, SessionState};
use crate::types::{DeviceStatus, HeartbeatResult, InitResult, ProcessResult};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use warden_pipeline::{CommandExecutor, PipelineError};
use warden_types::{CommandRequest, DeviceInfo};

// 结果错误码
const CODE_PARAM_ERROR: &str = "PARAM_ERROR";
const CODE_UNSUPPORTED_DEVICE: &str = "UNSUPPORTED_DEVICE";
const CODE_DECODE_ERROR: &str = "PROTOCOL_DECODE_ERROR";
const CODE_SESSION_NOT_FOUND: &str = "SESSION_NOT_FOUND";
const CODE_POOL_EXHAUSTED: &str = "POOL_EXHAUSTED";

/// RS485 协议服务
///
/// 持有每设备会话，消息处理走指令管道下发；
/// 设备级失败一律折叠成结果值，服务方法本身不返回错误。
pub struct Rs485ProtocolService {
    sessions: DashMap<String, Rs485Session>,
    pipeline: Arc<dyn CommandExecutor>,
    config: Rs485Config,
    /// 按操作类别计数（消息/错误），用于性能统计
    message_count: DashMap<String, u64>,
    error_count: DashMap<String, u64>,
}

impl Rs485ProtocolService {
    pub fn new(pipeline: Arc<dyn CommandExecutor>, config: Rs485Config) -> Self {
        Self {
            sessions: DashMap::new(),
            pipeline,
            config,
            message_count: DashMap::new(),
            error_count: DashMap::new(),
        }
    }

    /// 初始化设备会话
    ///
    /// 型号必须在静态目录内；已有会话视作重连，回到 `Initialized`。
    pub fn initialize_device(&self, device_id: &str, device_info: &DeviceInfo) -> InitResult {
        if device_id.trim().is_empty() {
            return InitResult::failure(device_id, "device id must not be empty");
        }
        if !catalog::is_device_model_supported(&device_info.model) {
            warn!(
                device_id = %device_id,
                model = %device_info.model,
                "Unsupported device model"
            );
            self.bump_error("initialize");
            return InitResult::failure(
                device_id,
                format!("unsupported device model: {}", device_info.model),
            );
        }

        let device_address = device_info
            .params
            .get("address")
            .and_then(|s| s.parse::<u8>().ok())
            .unwrap_or(0x01);

        match self.sessions.get_mut(device_id) {
            Some(mut session) => {
                session.reconnect();
                session.device_address = device_address;
                info!(device_id = %device_id, "Device session reconnected");
            }
            None => {
                let mut session = Rs485Session::new(device_id);
                session.device_address = device_address;
                self.sessions.insert(device_id.to_string(), session);
                info!(
                    device_id = %device_id,
                    model = %device_info.model,
                    address = %device_address,
                    "Device session initialized"
                );
            }
        }

        self.bump_message("initialize");
        InitResult::ok(
            device_id,
            device_info.params.get("serial_number").cloned(),
        )
    }

    /// 处理设备上行消息
    ///
    /// 解码帧、经管道分发、编码响应帧。畸形字节只产生失败结果，
    /// 不影响会话状态机。
    pub async fn process_device_message(
        &self,
        device_id: &str,
        raw: &[u8],
        protocol_type: &str,
    ) -> ProcessResult {
        if device_id.trim().is_empty() || raw.is_empty() || protocol_type.trim().is_empty() {
            return ProcessResult::failure(
                device_id,
                CODE_PARAM_ERROR,
                "device id, payload and protocol type are required",
            );
        }

        let frame = match Rs485Frame::decode(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(
                    device_id = %device_id,
                    payload = %hex::encode(raw),
                    error = %e,
                    "Frame decode failed"
                );
                self.bump_error("decode");
                return ProcessResult::failure(device_id, CODE_DECODE_ERROR, e.to_string());
            }
        };

        debug!(
            device_id = %device_id,
            function_code = format!("0x{:02X}", frame.function_code),
            data_len = %frame.data.len(),
            "Frame decoded"
        );

        // 心跳帧直接走会话状态机并回显
        if frame.is_heartbeat() {
            return self.process_heartbeat_frame(device_id, &frame);
        }

        let command_type = command_type_for(frame.function_code);
        let request = CommandRequest::new(device_id, command_type, frame.data.clone());

        let result = match self.pipeline.execute(&request).await {
            Ok(result) => result,
            Err(PipelineError::PoolExhausted { reason, .. }) => {
                self.bump_error("dispatch");
                return ProcessResult::failure(device_id, CODE_POOL_EXHAUSTED, reason);
            }
            Err(e) => {
                self.bump_error("dispatch");
                return ProcessResult::failure(device_id, CODE_PARAM_ERROR, e.to_string());
            }
        };

        if result.success {
            self.bump_message("process");
            // 成功应答：状态字节 0x00
            let response = Rs485Frame::new(frame.device_address, frame.function_code, vec![0x00])
                .encode()
                .unwrap_or_default();
            ProcessResult::ok(device_id, command_type, response, result.data)
        } else {
            self.bump_error("process");
            ProcessResult::failure(
                device_id,
                result
                    .error_code
                    .unwrap_or_else(|| "PROCESS_FAILED".to_string()),
                result.message,
            )
        }
    }

    /// 主动发送心跳探测
    pub async fn send_heartbeat(&self, device_id: &str) -> HeartbeatResult {
        let Some((address, sequence)) = self.sessions.get_mut(device_id).map(|mut s| {
            let seq = s.next_sequence();
            (s.device_address, seq)
        }) else {
            return HeartbeatResult {
                success: false,
                message: format!("no session for device {device_id}"),
                device_id: device_id.to_string(),
                online: false,
                sequence: 0,
                heartbeat_time: Utc::now(),
            };
        };

        let payload = encode_heartbeat(address, numeric_device_id(device_id), sequence);
        let request = CommandRequest::new(device_id, "HEARTBEAT", payload);

        let outcome = self.pipeline.execute(&request).await;
        let ok = matches!(&outcome, Ok(result) if result.success);

        let (state, message) = {
            // 管道调用期间不持有会话引用，避免跨 await 持锁
            let mut session = match self.sessions.get_mut(device_id) {
                Some(session) => session,
                None => {
                    return HeartbeatResult {
                        success: false,
                        message: "session removed during heartbeat".to_string(),
                        device_id: device_id.to_string(),
                        online: false,
                        sequence,
                        heartbeat_time: Utc::now(),
                    }
                }
            };
            if ok {
                session.record_heartbeat_ok();
                (session.state, "heartbeat ok".to_string())
            } else {
                session.record_heartbeat_timeout(self.config.max_consecutive_timeouts);
                let message = match outcome {
                    Ok(result) => result.message,
                    Err(e) => e.to_string(),
                };
                warn!(
                    device_id = %device_id,
                    sequence = %sequence,
                    consecutive_timeouts = %session.consecutive_timeouts,
                    state = %session.state.as_str(),
                    "Heartbeat missed"
                );
                (session.state, message)
            }
        };

        if ok {
            self.bump_message("heartbeat");
        } else {
            self.bump_error("heartbeat");
        }

        HeartbeatResult {
            success: ok,
            message,
            device_id: device_id.to_string(),
            online: state.is_online(),
            sequence,
            heartbeat_time: Utc::now(),
        }
    }

    /// 扫描心跳窗口
    ///
    /// 窗口内无响应的会话记一次超时；由监控侧周期调用。
    pub fn check_heartbeat_windows(&self) {
        let now = Utc::now();
        let window_ms = self.config.heartbeat_window_ms as i64;

        for mut entry in self.sessions.iter_mut() {
            if entry.state == SessionState::Disconnected {
                continue;
            }
            let reference = entry.last_heartbeat_at.unwrap_or(entry.initialized_at);
            let elapsed = now.signed_duration_since(reference).num_milliseconds();
            if elapsed > window_ms {
                entry.record_heartbeat_timeout(self.config.max_consecutive_timeouts);
                // 本轮已计超时，窗口基准前移
                entry.last_heartbeat_at = Some(now);
                warn!(
                    device_id = %entry.device_id,
                    elapsed_ms = %elapsed,
                    consecutive_timeouts = %entry.consecutive_timeouts,
                    state = %entry.state.as_str(),
                    "Heartbeat window elapsed without response"
                );
            }
        }
    }

    /// 查询设备状态
    pub fn get_device_status(&self, device_id: &str) -> DeviceStatus {
        match self.sessions.get(device_id) {
            Some(session) => DeviceStatus {
                device_id: device_id.to_string(),
                state: session.state,
                online: session.state.is_online(),
                consecutive_timeouts: session.consecutive_timeouts,
                last_heartbeat_at: session.last_heartbeat_at,
                check_time: Utc::now(),
            },
            None => DeviceStatus {
                device_id: device_id.to_string(),
                state: SessionState::Uninitialized,
                online: false,
                consecutive_timeouts: 0,
                last_heartbeat_at: None,
                check_time: Utc::now(),
            },
        }
    }

    /// 断开设备会话
    pub fn disconnect_device(&self, device_id: &str) -> bool {
        match self.sessions.get_mut(device_id) {
            Some(mut session) => {
                session.disconnect();
                info!(device_id = %device_id, "Device session disconnected");
                true
            }
            None => false,
        }
    }

    /// 型号是否受支持（纯查表）
    pub fn is_device_model_supported(&self, device_model: &str) -> bool {
        catalog::is_device_model_supported(device_model)
    }

    /// 全部受支持型号
    pub fn supported_device_models(&self) -> Vec<String> {
        catalog::supported_device_models()
    }

    /// 性能统计快照
    pub fn performance_statistics(&self) -> serde_json::Value {
        let messages: std::collections::HashMap<String, u64> = self
            .message_count
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        let errors: std::collections::HashMap<String, u64> = self
            .error_count
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        let online = self
            .sessions
            .iter()
            .filter(|s| s.state.is_online())
            .count();

        serde_json::json!({
            "session_count": self.sessions.len(),
            "online_sessions": online,
            "message_count": messages,
            "error_count": errors,
        })
    }

    fn process_heartbeat_frame(&self, device_id: &str, frame: &Rs485Frame) -> ProcessResult {
        let (hb_id, sequence) = match decode_heartbeat(frame) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.bump_error("decode");
                return ProcessResult::failure(device_id, CODE_DECODE_ERROR, e.to_string());
            }
        };

        let Some(mut session) = self.sessions.get_mut(device_id) else {
            return ProcessResult::failure(
                device_id,
                CODE_SESSION_NOT_FOUND,
                format!("no session for device {device_id}"),
            );
        };
        session.record_heartbeat_ok();
        drop(session);

        self.bump_message("heartbeat");
        debug!(
            device_id = %device_id,
            heartbeat_id = %hb_id,
            sequence = %sequence,
            "Device heartbeat received"
        );

        // 回显同一载荷作为应答
        let response = encode_heartbeat(frame.device_address, hb_id, sequence);
        ProcessResult::ok(device_id, command_type_for(codec::FUNCTION_HEARTBEAT), response, None)
    }

    fn bump_message(&self, kind: &str) {
        *self.message_count.entry(kind.to_string()).or_insert(0) += 1;
    }

    fn bump_error(&self, kind: &str) {
        *self.error_count.entry(kind.to_string()).or_insert(0) += 1;
    }
}

/// 设备 ID 的数字形式：尾部数字段，无数字时退化为字节校验和
fn numeric_device_id(device_id: &str) -> u32 {
    let digits: String = device_id
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits
        .parse::<u32>()
        .unwrap_or_else(|_| device_id.bytes().map(u32::from).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use warden_types::{CommandResult, DeviceKind, ProtocolType};

    /// 可切换成功/失败的管道替身
    struct TogglePipeline {
        fail: AtomicBool,
    }

    impl TogglePipeline {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                fail: AtomicBool::new(false),
            })
        }

        fn set_fail(&self, fail: bool) {
            self.fail.store(fail, Ordering::Release);
        }
    }

    #[async_trait]
    impl CommandExecutor for TogglePipeline {
        async fn execute(
            &self,
            request: &CommandRequest,
        ) -> warden_pipeline::Result<CommandResult> {
            if self.fail.load(Ordering::Acquire) {
                Ok(CommandResult::failure("COMMAND_EXECUTION_FAILURE", "no response"))
            } else {
                Ok(CommandResult::ok(
                    format!("executed {}", request.command_type),
                    Some(serde_json::json!({"echo": request.command_data.len()})),
                ))
            }
        }
    }

    fn device_info(model: &str) -> DeviceInfo {
        DeviceInfo::new(
            "dev_001",
            "siemens",
            model,
            DeviceKind::Industrial,
            ProtocolType::Rs485,
            "192.168.1.10",
            502,
        )
        .with_param("address", "17")
    }

    fn service(pipeline: Arc<TogglePipeline>) -> Rs485ProtocolService {
        Rs485ProtocolService::new(pipeline, Rs485Config::default())
    }

    #[tokio::test]
    async fn test_initialize_rejects_unknown_model() {
        let service = service(TogglePipeline::new());
        let result = service.initialize_device("dev_001", &device_info("NOT_A_MODEL"));
        assert!(!result.success);
        assert_eq!(
            service.get_device_status("dev_001").state,
            SessionState::Uninitialized
        );
    }

    #[tokio::test]
    async fn test_initialize_creates_session() {
        let service = service(TogglePipeline::new());
        let result = service.initialize_device("dev_001", &device_info("SIEMENS_S7_1200_V1"));
        assert!(result.success);

        let status = service.get_device_status("dev_001");
        assert_eq!(status.state, SessionState::Initialized);
        assert!(status.online);
    }

    #[tokio::test]
    async fn test_process_message_round_trip() {
        let pipeline = TogglePipeline::new();
        let service = service(pipeline);
        service.initialize_device("dev_001", &device_info("SIEMENS_S7_1200_V1"));

        let raw = Rs485Frame::new(0x11, codec::FUNCTION_READ_HOLDING_REGISTERS, vec![0x00, 0x10])
            .encode()
            .unwrap();
        let result = service.process_device_message("dev_001", &raw, "rs485").await;

        assert!(result.success);
        assert_eq!(result.command_type.as_deref(), Some("READ_HOLDING_REGISTERS"));
        let response = result.response_frame.unwrap();
        let response_frame = Rs485Frame::decode(&response).unwrap();
        assert_eq!(response_frame.data, vec![0x00]);
    }

    #[tokio::test]
    async fn test_malformed_bytes_do_not_crash_session() {
        let service = service(TogglePipeline::new());
        service.initialize_device("dev_001", &device_info("SIEMENS_S7_1200_V1"));

        let result = service
            .process_device_message("dev_001", &[0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x00], "rs485")
            .await;
        assert!(!result.success);
        assert_eq!(result.error_code.as_deref(), Some(CODE_DECODE_ERROR));

        // 会话状态机不受影响
        let status = service.get_device_status("dev_001");
        assert_eq!(status.state, SessionState::Initialized);
    }

    #[tokio::test]
    async fn test_heartbeat_frame_echoes_and_marks_ok() {
        let service = service(TogglePipeline::new());
        service.initialize_device("dev_001", &device_info("SIEMENS_S7_1200_V1"));

        let raw = encode_heartbeat(0x11, 1001, 3);
        let result = service.process_device_message("dev_001", &raw, "rs485").await;
        assert!(result.success);

        let echoed = Rs485Frame::decode(&result.response_frame.unwrap()).unwrap();
        let (hb_id, sequence) = decode_heartbeat(&echoed).unwrap();
        assert_eq!((hb_id, sequence), (1001, 3));

        assert_eq!(
            service.get_device_status("dev_001").state,
            SessionState::HeartbeatOk
        );
    }

    #[tokio::test]
    async fn test_three_failed_heartbeats_disconnect() {
        let pipeline = TogglePipeline::new();
        let service = service(pipeline.clone());
        service.initialize_device("dev_001", &device_info("SIEMENS_S7_1200_V1"));

        // 先确立 HEARTBEAT_OK
        let ok = service.send_heartbeat("dev_001").await;
        assert!(ok.success);
        assert_eq!(
            service.get_device_status("dev_001").state,
            SessionState::HeartbeatOk
        );

        pipeline.set_fail(true);
        for _ in 0..2 {
            let missed = service.send_heartbeat("dev_001").await;
            assert!(!missed.success);
            assert!(missed.online); // 尚未到断连阈值
        }
        let last = service.send_heartbeat("dev_001").await;
        assert!(!last.success);
        assert!(!last.online);
        assert_eq!(
            service.get_device_status("dev_001").state,
            SessionState::Disconnected
        );
    }

    #[tokio::test]
    async fn test_window_sweep_disconnects_silent_device() {
        let service = service(TogglePipeline::new());
        service.initialize_device("dev_001", &device_info("SIEMENS_S7_1200_V1"));

        let ok = service.send_heartbeat("dev_001").await;
        assert!(ok.success);

        // 设备自此沉默：逐轮回拨心跳时间制造超窗
        let backdate = |svc: &Rs485ProtocolService| {
            svc.sessions.get_mut("dev_001").unwrap().last_heartbeat_at =
                Some(Utc::now() - chrono::Duration::milliseconds(120_000));
        };

        backdate(&service);
        service.check_heartbeat_windows();
        assert_eq!(
            service.get_device_status("dev_001").state,
            SessionState::HeartbeatTimeout
        );

        for _ in 0..2 {
            backdate(&service);
            service.check_heartbeat_windows();
        }
        let status = service.get_device_status("dev_001");
        assert_eq!(status.state, SessionState::Disconnected);
        assert_eq!(status.consecutive_timeouts, 3);
    }

    #[tokio::test]
    async fn test_disconnect_and_reconnect() {
        let service = service(TogglePipeline::new());
        service.initialize_device("dev_001", &device_info("SIEMENS_S7_1200_V1"));

        assert!(service.disconnect_device("dev_001"));
        assert!(!service.get_device_status("dev_001").online);
        assert!(!service.disconnect_device("dev_missing"));

        // 重新初始化视作重连
        let result = service.initialize_device("dev_001", &device_info("SIEMENS_S7_1200_V1"));
        assert!(result.success);
        assert_eq!(
            service.get_device_status("dev_001").state,
            SessionState::Initialized
        );
    }

    #[tokio::test]
    async fn test_performance_statistics_counts_errors() {
        let service = service(TogglePipeline::new());
        service.initialize_device("dev_001", &device_info("SIEMENS_S7_1200_V1"));
        service
            .process_device_message("dev_001", &[0x00, 0x01, 0x02, 0x03, 0x04, 0x05], "rs485")
            .await;

        let stats = service.performance_statistics();
        assert_eq!(stats["session_count"], 1);
        assert_eq!(stats["error_count"]["decode"], 1);
    }

    #[test]
    fn test_numeric_device_id() {
        assert_eq!(numeric_device_id("dev_001"), 1);
        assert_eq!(numeric_device_id("gate42"), 42);
        assert!(numeric_device_id("no-digits") > 0);
    }
}
