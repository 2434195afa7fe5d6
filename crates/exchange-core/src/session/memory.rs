use crate::codec::PayloadCodec;
use crate::error::{ErrorBuilder, ErrorCode, ExchangeResult};
use crate::protocol::{Envelope, MessageHeader};
use crate::session::Session;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// A message captured by `MemorySession`
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub header: MessageHeader,
    pub body: Vec<u8>,
}

impl SentMessage {
    pub fn decode<T, C>(&self, codec: &C) -> ExchangeResult<Envelope<T>>
    where
        T: DeserializeOwned,
        C: PayloadCodec,
    {
        Ok(Envelope::new(self.header, codec.decode(&self.body)?))
    }
}

/// In-process session that records every message it is asked to send.
///
/// Used for loopback wiring and as the recording collaborator in tests.
#[derive(Debug)]
pub struct MemorySession {
    session_id: String,
    next_id: AtomicU64,
    id_step: u64,
    sent: Mutex<Vec<SentMessage>>,
    /// Sends succeed until this many messages were recorded
    fail_after: Mutex<Option<usize>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::with_ids(1, 1)
    }

    /// Assign ids `first, first + step, ...`
    pub fn with_ids(first: u64, step: u64) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            next_id: AtomicU64::new(first),
            id_step: step.max(1),
            sent: Mutex::new(Vec::new()),
            fail_after: Mutex::new(None),
        }
    }

    /// Make every send after the first `count` fail with `SendFailure`
    pub fn fail_after(&self, count: usize) {
        *lock(&self.fail_after) = Some(count);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        lock(&self.sent).clone()
    }

    pub fn sent_count(&self) -> usize {
        lock(&self.sent).len()
    }

    /// Drain recorded messages
    pub fn take(&self) -> Vec<SentMessage> {
        std::mem::take(&mut *lock(&self.sent))
    }
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Session for MemorySession {
    async fn send_message(&self, mut header: MessageHeader, body: Vec<u8>) -> ExchangeResult<u64> {
        let mut sent = lock(&self.sent);

        if let Some(limit) = *lock(&self.fail_after) {
            if sent.len() >= limit {
                return Err(ErrorBuilder::new(ErrorCode::SendFailure)
                    .message("memory session refused the message")
                    .with_header(&header)
                    .build());
            }
        }

        let message_id = self.next_id.fetch_add(self.id_step, Ordering::SeqCst);
        header.message_id = message_id;
        sent.push(SentMessage { header, body });

        Ok(message_id)
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MessageFlags;

    #[tokio::test]
    async fn assigns_increasing_ids_in_send_order() {
        let session = MemorySession::with_ids(2, 2);
        let header = session.create_header(4, 1, 0, MessageFlags::FINAL_PART);

        let first = session.send_message(header, vec![1]).await.unwrap();
        let second = session.send_message(header, vec![2]).await.unwrap();

        assert_eq!((first, second), (2, 4));
        let sent = session.sent();
        assert_eq!(sent[0].header.message_id, 2);
        assert_eq!(sent[1].body, vec![2]);
    }

    #[tokio::test]
    async fn injected_failure_reports_send_failure() {
        let session = MemorySession::new();
        session.fail_after(1);
        let header = session.create_header(4, 1, 0, MessageFlags::FINAL_PART);

        assert!(session.send_message(header, Vec::new()).await.is_ok());
        let err = session.send_message(header, Vec::new()).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::SendFailure);
        assert_eq!(session.sent_count(), 1);
    }
}
