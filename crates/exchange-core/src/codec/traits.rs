use crate::error::ExchangeResult;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// Encoder/decoder for message bodies.
///
/// Handlers decode inbound bodies with it, parameterized by the body type
/// registered for the message type, and encode every outbound body.
pub trait PayloadCodec: Send + Sync + Clone + Debug + 'static {
    /// Serialize a value to bytes
    fn encode<T>(&self, value: &T) -> ExchangeResult<Vec<u8>>
    where
        T: Serialize;

    /// Deserialize bytes to a value
    fn decode<T>(&self, bytes: &[u8]) -> ExchangeResult<T>
    where
        T: DeserializeOwned;

    /// Get the name of this codec (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Get the MIME type for this codec
    fn mime_type(&self) -> &'static str;
}
