//! The transport-side collaborator every handler sends through.

pub mod memory;

pub use memory::*;

use crate::error::ExchangeResult;
use crate::protocol::{MessageFlags, MessageHeader};
use async_trait::async_trait;

/// Sends encoded messages and assigns their message ids.
///
/// Implementations must preserve send order per destination: two awaited
/// `send_message` calls reach the peer in the order they were made.
#[async_trait]
pub trait Session: Send + Sync {
    /// Build the header of an outbound message. The message id stays unset
    /// until `send_message` assigns it.
    fn create_header(
        &self,
        protocol: u16,
        message_type: u16,
        correlation_id: u64,
        flags: MessageFlags,
    ) -> MessageHeader {
        MessageHeader::new(protocol, message_type, correlation_id, flags)
    }

    /// Send one message and return the id assigned to it
    async fn send_message(&self, header: MessageHeader, body: Vec<u8>) -> ExchangeResult<u64>;

    /// Identifier for logging
    fn session_id(&self) -> &str;
}
