use crate::error::types::{ErrorCode, ExchangeError};
use crate::protocol::{MessageHeader, RolePair};
use serde_json::Value;
use std::collections::HashMap;

/// Builder for constructing exchange errors with rich context
#[derive(Debug, Clone)]
pub struct ErrorBuilder {
    code: ErrorCode,
    message: String,
    data: HashMap<String, Value>,
}

impl ErrorBuilder {
    /// Start building an error with the given code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.description().to_string(),
            data: HashMap::new(),
        }
    }

    /// Set the error message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add a data field
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Add the routing fields of a header
    pub fn with_header(mut self, header: &MessageHeader) -> Self {
        self.data
            .insert("protocol".to_string(), Value::from(header.protocol));
        self.data
            .insert("message_type".to_string(), Value::from(header.message_type));
        self.data
            .insert("message_id".to_string(), Value::from(header.message_id));
        self.data.insert(
            "correlation_id".to_string(),
            Value::from(header.correlation_id),
        );
        self
    }

    pub fn with_roles(mut self, roles: &RolePair) -> Self {
        self.data
            .insert("role".to_string(), Value::from(roles.local.name()));
        self.data
            .insert("counterpart".to_string(), Value::from(roles.remote.name()));
        self
    }

    /// Record how many fragments made it out before a failure
    pub fn with_fragment(mut self, index: usize, total: usize) -> Self {
        self.data.insert(
            "fragment".to_string(),
            serde_json::json!({ "index": index, "total": total }),
        );
        self
    }

    /// Build the final error
    pub fn build(self) -> ExchangeError {
        if self.data.is_empty() {
            ExchangeError::new(self.code, self.message)
        } else {
            ExchangeError::with_data(
                self.code,
                self.message,
                Value::Object(self.data.into_iter().collect()),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{MessageFlags, Role};

    #[test]
    fn builder_collects_header_and_fragment_context() {
        let mut header = MessageHeader::new(3, 2, 8, MessageFlags::MULTI_PART);
        header.message_id = 11;

        let err = ErrorBuilder::new(ErrorCode::SendFailure)
            .message("connection reset")
            .with_header(&header)
            .with_roles(&RolePair::new(Role::Store, Role::Customer))
            .with_fragment(1, 3)
            .build();

        let data = err.data.expect("context data");
        assert_eq!(err.code, ErrorCode::SendFailure);
        assert_eq!(data["correlation_id"], 8);
        assert_eq!(data["role"], "store");
        assert_eq!(data["fragment"]["index"], 1);
    }

    #[test]
    fn builder_without_data_uses_plain_error() {
        let err = ErrorBuilder::new(ErrorCode::SessionClosed).build();
        assert_eq!(err.data, None);
        assert_eq!(err.message, ErrorCode::SessionClosed.description());
    }
}
