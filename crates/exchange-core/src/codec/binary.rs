use crate::codec::{
    config::{BincodeConfig, CodecConfig},
    traits::*,
};
use crate::error::{ErrorCode, ExchangeError, ExchangeResult};
use serde::{de::DeserializeOwned, Serialize};

/// Default codec: compact binary bodies
#[derive(Debug, Clone, Default)]
pub struct BincodeCodec {
    config: BincodeConfig,
}

impl BincodeCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(codec_config: CodecConfig) -> Self {
        Self {
            config: codec_config.bincode,
        }
    }

    pub fn config(&self) -> &BincodeConfig {
        &self.config
    }

    fn check_size(&self, size: usize) -> ExchangeResult<()> {
        self.config
            .check_size_limit(size)
            .map_err(|e| ExchangeError::new(ErrorCode::MessageTooLarge, e))
    }
}

impl PayloadCodec for BincodeCodec {
    fn encode<T>(&self, value: &T) -> ExchangeResult<Vec<u8>>
    where
        T: Serialize,
    {
        let serialized_bytes = if self.config.little_endian {
            bincode::serde::encode_to_vec(value, bincode::config::standard().with_little_endian())
        } else {
            bincode::serde::encode_to_vec(value, bincode::config::standard().with_big_endian())
        }
        .map_err(|e| {
            ExchangeError::encode_failure(format!("Failed to serialize with bincode: {}", e))
        })?;

        self.check_size(serialized_bytes.len())?;

        Ok(serialized_bytes)
    }

    fn decode<T>(&self, bytes: &[u8]) -> ExchangeResult<T>
    where
        T: DeserializeOwned,
    {
        // Check size limit before decoding
        self.check_size(bytes.len())?;

        let (deserialized_value, bytes_read) = if self.config.little_endian {
            bincode::serde::decode_from_slice(
                bytes,
                bincode::config::standard().with_little_endian(),
            )
        } else {
            bincode::serde::decode_from_slice(bytes, bincode::config::standard().with_big_endian())
        }
        .map_err(|e| {
            ExchangeError::decode_failure(format!("Failed to deserialize with bincode: {}", e))
        })?;

        if bytes_read != bytes.len() {
            return Err(ExchangeError::decode_failure(format!(
                "{} trailing bytes after bincode body of {} bytes",
                bytes.len() - bytes_read,
                bytes_read
            )));
        }

        Ok(deserialized_value)
    }

    fn name(&self) -> &'static str {
        "bincode"
    }

    fn mime_type(&self) -> &'static str {
        "application/octet-stream"
    }
}
