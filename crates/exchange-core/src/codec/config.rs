use serde::{Deserialize, Serialize};

/// Configuration for bincode serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BincodeConfig {
    /// Maximum encoded body size
    pub limit: Option<u64>,
    /// Whether to use little endian (most common)
    pub little_endian: bool,
}

impl Default for BincodeConfig {
    fn default() -> Self {
        Self {
            limit: Some(crate::protocol::MAX_MESSAGE_SIZE as u64),
            little_endian: true,
        }
    }
}

impl BincodeConfig {
    /// Check if data size exceeds our limit
    pub fn check_size_limit(&self, size: usize) -> Result<(), String> {
        if let Some(limit) = self.limit {
            if size as u64 > limit {
                return Err(format!("Data size {} exceeds limit {}", size, limit));
            }
        }
        Ok(())
    }
}

/// Global codec configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub bincode: BincodeConfig,
}
