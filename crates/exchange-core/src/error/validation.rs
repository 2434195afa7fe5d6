use crate::error::builder::ErrorBuilder;
use crate::error::types::{ErrorCode, ExchangeError};
use crate::protocol::{MessageFlags, MessageHeader};

/// Validation helpers for outbound headers
pub struct HeaderValidator;

impl HeaderValidator {
    /// Validate the flag combination of a header
    pub fn validate_flags(header: &MessageHeader) -> Result<(), ExchangeError> {
        let flags = header.flags;

        if flags.contains(MessageFlags::NO_DATA) && flags.intersects(MessageFlags::PART_MASK) {
            return Err(ErrorBuilder::new(ErrorCode::InvalidHeader)
                .message("NO_DATA cannot be combined with MULTI_PART or FINAL_PART")
                .with_header(header)
                .with_data("flags", flags.bits())
                .build());
        }

        if flags.contains(MessageFlags::PART_MASK) {
            return Err(ErrorBuilder::new(ErrorCode::InvalidHeader)
                .message("A fragment is either MULTI_PART or FINAL_PART, not both")
                .with_header(header)
                .with_data("flags", flags.bits())
                .build());
        }

        Ok(())
    }

    /// Validate a header that answers another message
    pub fn validate_response(header: &MessageHeader) -> Result<(), ExchangeError> {
        Self::validate_flags(header)?;

        if header.correlation_id == 0 {
            return Err(ErrorBuilder::new(ErrorCode::InvalidHeader)
                .message("Response header must carry the request's message id")
                .with_header(header)
                .build());
        }

        Ok(())
    }

    /// Validate a header that starts a new exchange
    pub fn validate_request(header: &MessageHeader) -> Result<(), ExchangeError> {
        Self::validate_flags(header)?;

        if header.flags.contains(MessageFlags::NO_DATA) {
            return Err(ErrorBuilder::new(ErrorCode::InvalidHeader)
                .message("A request cannot be flagged NO_DATA")
                .with_header(header)
                .build());
        }

        Ok(())
    }
}
