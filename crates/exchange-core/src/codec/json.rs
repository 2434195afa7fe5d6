use crate::codec::traits::*;
use crate::error::{ExchangeError, ExchangeResult};
use serde::{de::DeserializeOwned, Serialize};

/// JSON codec for debugging and tooling
#[derive(Debug, Clone, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn new() -> Self {
        Self
    }
}

impl PayloadCodec for JsonCodec {
    fn encode<T>(&self, value: &T) -> ExchangeResult<Vec<u8>>
    where
        T: Serialize,
    {
        serde_json::to_vec(value).map_err(|e| ExchangeError::encode_failure(format!("JSON serialization failed: {}", e)))
    }

    fn decode<T>(&self, bytes: &[u8]) -> ExchangeResult<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(bytes)
            .map_err(|e| ExchangeError::decode_failure(format!("JSON parsing failed: {}", e)))
    }

    fn name(&self) -> &'static str {
        "json"
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }
}
