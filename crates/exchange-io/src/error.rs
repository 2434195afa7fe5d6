//! Stream-level error types

use exchange_core::{ErrorBuilder, ErrorCode, ExchangeError};
use thiserror::Error;

pub type IoResult<T> = Result<T, IoError>;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Failed to send {bytes} bytes: {reason}")]
    SendFailed { bytes: usize, reason: String },

    #[error("Frame of {size} bytes exceeds limit of {max}")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Stream is closed")]
    StreamClosed,

    #[error("Invalid envelope header: {reason}")]
    InvalidHeader { reason: String },

    #[error("System error")]
    System(#[from] std::io::Error),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

impl IoError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::System(e) => matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Whether the peer can no longer be reached on this stream
    pub fn is_closed(&self) -> bool {
        match self {
            Self::StreamClosed => true,
            Self::System(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
            ),
            _ => false,
        }
    }
}

impl From<IoError> for ExchangeError {
    fn from(error: IoError) -> Self {
        match error {
            IoError::Exchange(inner) => inner,
            IoError::System(e) => ExchangeError::from(e),
            IoError::SendFailed { bytes, reason } => ErrorBuilder::new(ErrorCode::SendFailure)
                .message(reason)
                .with_data("bytes", bytes)
                .build(),
            IoError::FrameTooLarge { size, max } => ErrorBuilder::new(ErrorCode::MessageTooLarge)
                .message(format!("frame of {size} bytes exceeds limit of {max}"))
                .with_data("size", size)
                .build(),
            IoError::StreamClosed => ExchangeError::new(ErrorCode::SessionClosed, "stream is closed"),
            IoError::InvalidHeader { reason } => ExchangeError::invalid_header(reason),
        }
    }
}
