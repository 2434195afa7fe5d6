use crate::protocol::constants::NO_CORRELATION;
use crate::protocol::flags::MessageFlags;
use serde::{Deserialize, Serialize};

/// Routing and correlation fields that precede every message body.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub protocol: u16,
    pub message_type: u16,
    /// Message id of the request this message answers, or `NO_CORRELATION`
    pub correlation_id: u64,
    /// Assigned by the session when the message is sent
    pub message_id: u64,
    pub flags: MessageFlags,
}

/// A header together with its body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub header: MessageHeader,
    pub body: T,
}

impl MessageHeader {
    pub fn new(protocol: u16, message_type: u16, correlation_id: u64, flags: MessageFlags) -> Self {
        MessageHeader {
            protocol,
            message_type,
            correlation_id,
            message_id: 0,
            flags,
        }
    }

    /// Header for a message that starts an exchange
    pub fn new_request(protocol: u16, message_type: u16, flags: MessageFlags) -> Self {
        Self::new(protocol, message_type, NO_CORRELATION, flags)
    }

    /// Whether this message closes its logical response
    pub fn is_final(&self) -> bool {
        self.flags.contains(MessageFlags::FINAL_PART) || self.flags.contains(MessageFlags::NO_DATA)
    }

    pub fn is_no_data(&self) -> bool {
        self.flags.contains(MessageFlags::NO_DATA)
    }

    pub fn acknowledge_requested(&self) -> bool {
        self.flags.contains(MessageFlags::ACKNOWLEDGE)
    }
}

impl<T> Envelope<T> {
    pub fn new(header: MessageHeader, body: T) -> Self {
        Envelope { header, body }
    }
}
