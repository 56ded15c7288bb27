use thiserror::Error;

/// 帧解码错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Frame too short: {len} bytes")]
    TooShort { len: usize },

    #[error("Bad start byte: 0x{0:02X}")]
    BadStartByte(u8),

    #[error("Frame length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("CRC mismatch: expected 0x{expected:04X}, got 0x{actual:04X}")]
    CrcMismatch { expected: u16, actual: u16 },

    #[error("Unexpected function code 0x{0:02X}")]
    UnexpectedFunction(u8),

    #[error("Payload too large: {0} bytes")]
    PayloadTooLarge(usize),
}

/// RS485 协议错误类型
#[derive(Error, Debug)]
pub enum Rs485Error {
    #[error("Protocol decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Unsupported device model: {0}")]
    UnsupportedModel(String),

    #[error("No session for device: {0}")]
    SessionNotFound(String),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// RS485 结果类型
pub type Result<T> = std::result::Result<T, Rs485Error>;
