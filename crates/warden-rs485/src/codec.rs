use crate::error::DecodeError;
use bytes::{BufMut, BytesMut};

/// 标准帧起始字节
pub const FRAME_START: u8 = 0xAA;

/// 旧版设备使用的起始字节
pub const FRAME_START_LEGACY: u8 = 0x55;

/// 帧头（起始 + 地址 + 功能码 + 长度）
const HEADER_LEN: usize = 4;

/// CRC16 尾部长度
const CRC_LEN: usize = 2;

/// 单帧数据区上限（长度字段一个字节）
pub const MAX_PAYLOAD: usize = 255;

// Modbus 风格功能码
pub const FUNCTION_READ_COILS: u8 = 0x01;
pub const FUNCTION_READ_DISCRETE_INPUTS: u8 = 0x02;
pub const FUNCTION_READ_HOLDING_REGISTERS: u8 = 0x03;
pub const FUNCTION_READ_INPUT_REGISTERS: u8 = 0x04;
pub const FUNCTION_WRITE_SINGLE_COIL: u8 = 0x05;
pub const FUNCTION_WRITE_SINGLE_REGISTER: u8 = 0x06;
pub const FUNCTION_HEARTBEAT: u8 = 0x0B;
pub const FUNCTION_WRITE_MULTIPLE_COILS: u8 = 0x0F;
pub const FUNCTION_WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

/// RS485 帧
///
/// 线格式：`起始(1) 地址(1) 功能码(1) 长度(1) 数据(n) CRC16(2)`，
/// CRC 覆盖 CRC 之前的全部字节，低字节在前（Modbus RTU 约定）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rs485Frame {
    pub device_address: u8,
    pub function_code: u8,
    pub data: Vec<u8>,
}

impl Rs485Frame {
    pub fn new(device_address: u8, function_code: u8, data: Vec<u8>) -> Self {
        Self {
            device_address,
            function_code,
            data,
        }
    }

    /// 编码为线格式字节
    pub fn encode(&self) -> Result<Vec<u8>, DecodeError> {
        if self.data.len() > MAX_PAYLOAD {
            return Err(DecodeError::PayloadTooLarge(self.data.len()));
        }

        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.data.len() + CRC_LEN);
        buf.put_u8(FRAME_START);
        buf.put_u8(self.device_address);
        buf.put_u8(self.function_code);
        buf.put_u8(self.data.len() as u8);
        buf.put_slice(&self.data);

        let crc = crc16_modbus(&buf);
        buf.put_u8((crc & 0xFF) as u8);
        buf.put_u8((crc >> 8) as u8);

        Ok(buf.to_vec())
    }

    /// 从线格式解码
    ///
    /// 起始字节接受 `0xAA` 与旧版 `0x55`，其余布局一致；
    /// 任何畸形输入都是 `DecodeError` 值，不会 panic。
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        if raw.len() < HEADER_LEN + CRC_LEN {
            return Err(DecodeError::TooShort { len: raw.len() });
        }
        if raw[0] != FRAME_START && raw[0] != FRAME_START_LEGACY {
            return Err(DecodeError::BadStartByte(raw[0]));
        }

        let device_address = raw[1];
        let function_code = raw[2];
        let data_len = raw[3] as usize;

        let expected = HEADER_LEN + data_len + CRC_LEN;
        if raw.len() != expected {
            return Err(DecodeError::LengthMismatch {
                expected,
                actual: raw.len(),
            });
        }

        let crc_offset = HEADER_LEN + data_len;
        let actual = u16::from(raw[crc_offset]) | (u16::from(raw[crc_offset + 1]) << 8);
        let expected_crc = crc16_modbus(&raw[..crc_offset]);
        if actual != expected_crc {
            return Err(DecodeError::CrcMismatch {
                expected: expected_crc,
                actual,
            });
        }

        Ok(Self {
            device_address,
            function_code,
            data: raw[HEADER_LEN..crc_offset].to_vec(),
        })
    }

    /// 是否为心跳帧
    pub fn is_heartbeat(&self) -> bool {
        self.function_code == FUNCTION_HEARTBEAT
    }
}

/// 心跳帧载荷：设备 ID（u32 大端）+ 序号（u16 大端）
pub fn encode_heartbeat(device_address: u8, device_id: u32, sequence: u16) -> Vec<u8> {
    let mut data = Vec::with_capacity(6);
    data.extend_from_slice(&device_id.to_be_bytes());
    data.extend_from_slice(&sequence.to_be_bytes());
    // 载荷固定 6 字节，encode 不会失败
    Rs485Frame::new(device_address, FUNCTION_HEARTBEAT, data)
        .encode()
        .unwrap_or_default()
}

/// 解析心跳帧载荷
pub fn decode_heartbeat(frame: &Rs485Frame) -> Result<(u32, u16), DecodeError> {
    if frame.function_code != FUNCTION_HEARTBEAT {
        return Err(DecodeError::UnexpectedFunction(frame.function_code));
    }
    if frame.data.len() != 6 {
        return Err(DecodeError::LengthMismatch {
            expected: 6,
            actual: frame.data.len(),
        });
    }
    let device_id = u32::from_be_bytes([frame.data[0], frame.data[1], frame.data[2], frame.data[3]]);
    let sequence = u16::from_be_bytes([frame.data[4], frame.data[5]]);
    Ok((device_id, sequence))
}

/// 功能码对应的指令类型名
pub fn command_type_for(function_code: u8) -> &'static str {
    match function_code {
        FUNCTION_READ_COILS => "READ_COILS",
        FUNCTION_READ_DISCRETE_INPUTS => "READ_DISCRETE_INPUTS",
        FUNCTION_READ_HOLDING_REGISTERS => "READ_HOLDING_REGISTERS",
        FUNCTION_READ_INPUT_REGISTERS => "READ_INPUT_REGISTERS",
        FUNCTION_WRITE_SINGLE_COIL => "WRITE_SINGLE_COIL",
        FUNCTION_WRITE_SINGLE_REGISTER => "WRITE_SINGLE_REGISTER",
        FUNCTION_HEARTBEAT => "HEARTBEAT",
        FUNCTION_WRITE_MULTIPLE_COILS => "WRITE_MULTIPLE_COILS",
        FUNCTION_WRITE_MULTIPLE_REGISTERS => "WRITE_MULTIPLE_REGISTERS",
        _ => "UNKNOWN",
    }
}

/// Modbus RTU 标准 CRC16（多项式 0xA001）
pub fn crc16_modbus(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc >>= 1;
                crc ^= 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_round_trip() {
        let frame = Rs485Frame::new(0x11, FUNCTION_READ_HOLDING_REGISTERS, vec![0x00, 0x10, 0x00, 0x02]);
        let raw = frame.encode().unwrap();
        let decoded = Rs485Frame::decode(&raw).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_heartbeat_round_trip_preserves_id_and_sequence() {
        let raw = encode_heartbeat(0x11, 42_0042, 7);
        let frame = Rs485Frame::decode(&raw).unwrap();
        assert!(frame.is_heartbeat());

        let (device_id, sequence) = decode_heartbeat(&frame).unwrap();
        assert_eq!(device_id, 42_0042);
        assert_eq!(sequence, 7);
    }

    #[test]
    fn test_empty_payload_round_trip() {
        let frame = Rs485Frame::new(0x01, FUNCTION_READ_COILS, vec![]);
        let raw = frame.encode().unwrap();
        assert_eq!(raw.len(), 6);
        assert_eq!(Rs485Frame::decode(&raw).unwrap(), frame);
    }

    #[test]
    fn test_decode_rejects_short_frame() {
        assert_eq!(
            Rs485Frame::decode(&[0xAA, 0x01]),
            Err(DecodeError::TooShort { len: 2 })
        );
    }

    #[test]
    fn test_decode_rejects_bad_start_byte() {
        let mut raw = Rs485Frame::new(0x01, 0x03, vec![]).encode().unwrap();
        raw[0] = 0x77;
        assert_eq!(Rs485Frame::decode(&raw), Err(DecodeError::BadStartByte(0x77)));
    }

    #[test]
    fn test_decode_accepts_legacy_start_byte() {
        let mut raw = Rs485Frame::new(0x01, 0x03, vec![0x05]).encode().unwrap();
        raw[0] = FRAME_START_LEGACY;
        // 起始字节参与 CRC，换头后需重算
        let crc_offset = raw.len() - 2;
        let crc = crc16_modbus(&raw[..crc_offset]);
        raw[crc_offset] = (crc & 0xFF) as u8;
        raw[crc_offset + 1] = (crc >> 8) as u8;

        let frame = Rs485Frame::decode(&raw).unwrap();
        assert_eq!(frame.data, vec![0x05]);
    }

    #[test]
    fn test_decode_rejects_corrupted_crc() {
        let mut raw = Rs485Frame::new(0x01, 0x03, vec![0x05, 0x06]).encode().unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        assert!(matches!(
            Rs485Frame::decode(&raw),
            Err(DecodeError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_payload() {
        let raw = Rs485Frame::new(0x01, 0x03, vec![1, 2, 3, 4]).encode().unwrap();
        assert!(matches!(
            Rs485Frame::decode(&raw[..raw.len() - 2]),
            Err(DecodeError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_crc16_known_vector() {
        // Modbus RTU 参考向量：01 03 00 00 00 01 → CRC 0x0A84
        let crc = crc16_modbus(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!(crc, 0x0A84);
    }

    #[test]
    fn test_command_type_mapping() {
        assert_eq!(command_type_for(0x03), "READ_HOLDING_REGISTERS");
        assert_eq!(command_type_for(FUNCTION_HEARTBEAT), "HEARTBEAT");
        assert_eq!(command_type_for(0x7F), "UNKNOWN");
    }
}
