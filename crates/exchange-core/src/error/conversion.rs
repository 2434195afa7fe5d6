use crate::error::types::{ErrorCode, ExchangeError};
use std::convert::From;

/// Convert from common error types
impl From<std::io::Error> for ExchangeError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let (code, message) = match err.kind() {
            ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::WriteZero => (ErrorCode::SendFailure, "Transport write failed"),
            ErrorKind::UnexpectedEof => (ErrorCode::SessionClosed, "Session closed"),
            ErrorKind::InvalidData => (ErrorCode::DecodeFailure, "Invalid data"),
            _ => (ErrorCode::InternalError, "I/O error"),
        };

        ExchangeError::with_data(
            code,
            format!("{}: {}", message, err),
            serde_json::json!({ "io_error": err.to_string() }),
        )
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        let code = if err.is_io() {
            ErrorCode::InternalError
        } else {
            ErrorCode::DecodeFailure
        };

        ExchangeError::with_data(
            code,
            format!("JSON error: {}", err),
            serde_json::json!({ "json_error": err.to_string() }),
        )
    }
}

impl From<bincode::error::EncodeError> for ExchangeError {
    fn from(err: bincode::error::EncodeError) -> Self {
        ExchangeError::with_data(
            ErrorCode::EncodeFailure,
            format!("Binary serialization error: {}", err),
            serde_json::json!({ "bincode_error": err.to_string() }),
        )
    }
}

impl From<bincode::error::DecodeError> for ExchangeError {
    fn from(err: bincode::error::DecodeError) -> Self {
        ExchangeError::with_data(
            ErrorCode::DecodeFailure,
            format!("Binary deserialization error: {}", err),
            serde_json::json!({ "bincode_error": err.to_string() }),
        )
    }
}
