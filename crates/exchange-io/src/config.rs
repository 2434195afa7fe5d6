use exchange_core::{ExchangeResult, Role, MAX_MESSAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Stream settings of a framed session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Largest frame accepted or sent, header included
    pub max_frame_size: usize,
    pub write_buffer_capacity: usize,
    pub read_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_frame_size: MAX_MESSAGE_SIZE,
            write_buffer_capacity: 8192,
            read_buffer_size: 8192,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> ExchangeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }
}

/// Message ids of one endpoint. Customers use even ids and stores odd
/// ids, so the two directions of a session never collide.
#[derive(Debug)]
pub struct MessageIdSequence {
    next: AtomicU64,
}

impl MessageIdSequence {
    pub fn for_role(role: Role) -> Self {
        let first = match role {
            Role::Customer => 2,
            Role::Store => 1,
        };
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(2, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_draw_from_disjoint_sequences() {
        let customer = MessageIdSequence::for_role(Role::Customer);
        let store = MessageIdSequence::for_role(Role::Store);

        let customer_ids: Vec<u64> = (0..3).map(|_| customer.next_id()).collect();
        let store_ids: Vec<u64> = (0..3).map(|_| store.next_id()).collect();

        assert_eq!(customer_ids, vec![2, 4, 6]);
        assert_eq!(store_ids, vec![1, 3, 5]);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SessionConfig::from_json_str(r#"{ "max_frame_size": 1024 }"#).unwrap();
        assert_eq!(config.max_frame_size, 1024);
        assert_eq!(config.read_buffer_size, 8192);
    }
}
