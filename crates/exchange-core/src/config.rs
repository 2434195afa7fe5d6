use crate::codec::CodecConfig;
use crate::error::ExchangeResult;
use serde::{Deserialize, Serialize};

/// What a handler does with a message type it does not recognize
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnrecognizedPolicy {
    /// Report it to the caller of `dispatch`
    #[default]
    Report,
    /// Also answer the sender with a `ProtocolException`
    ReportAndRespond,
}

/// Handler configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    pub codec: CodecConfig,
    pub unrecognized: UnrecognizedPolicy,
}

impl HandlerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON document; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> ExchangeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_codec(mut self, codec: CodecConfig) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_unrecognized(mut self, policy: UnrecognizedPolicy) -> Self {
        self.unrecognized = policy;
        self
    }

    /// Answer unknown messages with a protocol exception
    pub fn strict() -> Self {
        Self::default().with_unrecognized(UnrecognizedPolicy::ReportAndRespond)
    }
}
