use crate::protocol::{MessageHeader, RolePair};
use std::time::Instant;

/// Per-message state handed to every observer of a notification gate.
///
/// `accumulator` is what the reply path sends if nobody cancels.
#[derive(Debug, Clone)]
pub struct ProcessingContext<B, A = ()> {
    /// Header of the inbound message
    pub header: MessageHeader,

    /// Decoded inbound body
    pub body: B,

    /// Result being built for the reply
    pub accumulator: A,

    /// Roles of the handler that received the message
    pub roles: RolePair,

    /// When the message reached the gate
    pub received_at: Instant,

    /// Tracing correlation ID
    pub trace_id: String,

    cancelled: bool,
}

impl<B, A> ProcessingContext<B, A> {
    pub fn new(header: MessageHeader, body: B, accumulator: A, roles: RolePair) -> Self {
        Self {
            header,
            body,
            accumulator,
            roles,
            received_at: Instant::now(),
            trace_id: uuid::Uuid::new_v4().to_string(),
            cancelled: false,
        }
    }

    /// Suppress the reply. Remaining observers still run.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Swap in a new result, returning the previous one
    pub fn replace(&mut self, accumulator: A) -> A {
        std::mem::replace(&mut self.accumulator, accumulator)
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.received_at.elapsed()
    }
}

impl<B, T> ProcessingContext<B, Vec<T>> {
    pub fn push(&mut self, item: T) {
        self.accumulator.push(item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        self.accumulator.extend(items);
    }
}
