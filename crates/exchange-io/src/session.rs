use crate::config::{MessageIdSequence, SessionConfig};
use crate::envelope::encode_envelope;
use crate::error::IoError;
use crate::framer::LengthPrefixedFramer;
use crate::writer::MessageWriter;
use async_trait::async_trait;
use exchange_core::{
    ErrorBuilder, ErrorCode, ExchangeError, ExchangeResult, MessageHeader, Role, Session,
};
use tokio::io::AsyncWrite;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

/// `Session` over a byte stream. Each message becomes one frame holding
/// the encoded header and the body, written and flushed before
/// `send_message` returns.
///
/// A frame whose write fails is dropped, never resent with a later one.
/// Once a frame was cut off mid-write every later send fails with
/// `SessionClosed`.
pub struct FramedSession<W> {
    session_id: String,
    role: Role,
    ids: MessageIdSequence,
    writer: Mutex<MessageWriter<W>>,
}

impl<W> FramedSession<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W, role: Role) -> Self {
        Self::with_config(writer, role, &SessionConfig::default())
    }

    pub fn with_config(writer: W, role: Role, config: &SessionConfig) -> Self {
        let framer = LengthPrefixedFramer::new().with_max_frame_size(config.max_frame_size);
        let writer = MessageWriter::with_buffer_size(writer, config.write_buffer_capacity, 0)
            .with_framer(framer);
        let session_id = uuid::Uuid::new_v4().to_string();

        debug!(session = %session_id, role = %role, "framed session opened");

        Self {
            session_id,
            role,
            ids: MessageIdSequence::for_role(role),
            writer: Mutex::new(writer),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// (messages_written, bytes_written)
    pub async fn stats(&self) -> (u64, u64) {
        self.writer.lock().await.stats()
    }
}

#[async_trait]
impl<W> Session for FramedSession<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send_message(&self, mut header: MessageHeader, body: Vec<u8>) -> ExchangeResult<u64> {
        // Ids are drawn under the writer lock so they reach the stream in order
        let mut writer = self.writer.lock().await;
        let message_id = self.ids.next_id();
        header.message_id = message_id;

        let frame = encode_envelope(&header, &body)?;
        if let Err(error) = writer.write_immediate(&frame).await {
            warn!(
                session = %self.session_id,
                message_id,
                broken = writer.is_broken(),
                error = %error,
                "frame not sent"
            );
            return Err(send_error(error, &header));
        }

        trace!(
            session = %self.session_id,
            message_id,
            bytes = frame.len(),
            "frame written"
        );
        Ok(message_id)
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }
}

fn send_error(error: IoError, header: &MessageHeader) -> ExchangeError {
    match error {
        IoError::System(e) => ErrorBuilder::new(ErrorCode::SendFailure)
            .message(format!("frame write failed: {e}"))
            .with_header(header)
            .with_data("io_error", e.to_string())
            .build(),
        other => ExchangeError::from(other),
    }
}

impl<W> std::fmt::Debug for FramedSession<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramedSession")
            .field("session_id", &self.session_id)
            .field("role", &self.role)
            .finish()
    }
}
