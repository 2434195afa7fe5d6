use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Main exchange error type
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExchangeError {
    /// Standardized error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Additional error context (protocol, message type, ids...)
    pub data: Option<serde_json::Value>,

    /// Error occurred at this timestamp
    pub timestamp: SystemTime,
}

/// Standardized error codes
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    // Dispatch errors (1000-1999)
    UnrecognizedMessageType = 1000,
    DecodeFailure = 1001,
    InvalidHeader = 1002,
    DuplicateRegistration = 1003,

    // Delivery errors (2000-2999)
    SendFailure = 2000,
    EncodeFailure = 2001,
    MessageTooLarge = 2002,
    SessionClosed = 2003,

    // Handler errors (3000-3999)
    InternalError = 3000,
}

impl ExchangeError {
    /// Create a new exchange error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
            timestamp: SystemTime::now(),
        }
    }

    /// Create error with additional data
    pub fn with_data(code: ErrorCode, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
            timestamp: SystemTime::now(),
        }
    }

    // Convenience constructors for common errors

    pub fn unrecognized_message_type(protocol: u16, message_type: u16) -> Self {
        Self::with_data(
            ErrorCode::UnrecognizedMessageType,
            format!(
                "Message type {} is not recognized by protocol {}",
                message_type, protocol
            ),
            serde_json::json!({ "protocol": protocol, "message_type": message_type }),
        )
    }

    pub fn decode_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DecodeFailure, message)
    }

    pub fn encode_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EncodeFailure, message)
    }

    pub fn send_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SendFailure, message)
    }

    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidHeader, message)
    }

    pub fn duplicate_registration(protocol: u16, message_type: u16) -> Self {
        Self::with_data(
            ErrorCode::DuplicateRegistration,
            format!(
                "Message type {} is already registered for protocol {}",
                message_type, protocol
            ),
            serde_json::json!({ "protocol": protocol, "message_type": message_type }),
        )
    }

    /// Check if this error was raised while routing an inbound message
    pub fn is_dispatch_error(&self) -> bool {
        (1000..2000).contains(&(self.code as u32))
    }

    /// Check if this error was raised while delivering an outbound message
    pub fn is_delivery_error(&self) -> bool {
        (2000..3000).contains(&(self.code as u32))
    }
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code as u32, self.message)
    }
}

impl std::error::Error for ExchangeError {}

impl ErrorCode {
    /// Get human-readable description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnrecognizedMessageType => "Message type not recognized for this protocol/role",
            Self::DecodeFailure => "Message body could not be decoded",
            Self::InvalidHeader => "Message header is invalid",
            Self::DuplicateRegistration => "Message type registered more than once",

            Self::SendFailure => "Transport failed to send the message",
            Self::EncodeFailure => "Message body could not be encoded",
            Self::MessageTooLarge => "Message exceeds the configured size limit",
            Self::SessionClosed => "Session is closed",

            Self::InternalError => "Internal handler error",
        }
    }

    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1000 => Some(Self::UnrecognizedMessageType),
            1001 => Some(Self::DecodeFailure),
            1002 => Some(Self::InvalidHeader),
            1003 => Some(Self::DuplicateRegistration),
            2000 => Some(Self::SendFailure),
            2001 => Some(Self::EncodeFailure),
            2002 => Some(Self::MessageTooLarge),
            2003 => Some(Self::SessionClosed),
            3000 => Some(Self::InternalError),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u32)
    }
}
