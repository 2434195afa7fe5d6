use crate::config::SessionConfig;
use crate::error::{IoError, IoResult};
use crate::framer::LengthPrefixedFramer;
use crate::reader::MessageReader;
use bytes::Bytes;
use exchange_core::{DispatchOutcome, ExchangeResult, HandlerSet, MessageHeader};
use tokio::io::AsyncRead;
use tracing::trace;

fn header_config() -> bincode::config::Configuration {
    bincode::config::standard()
}

/// Frame payload of one envelope: the encoded header followed by the body
pub fn encode_envelope(header: &MessageHeader, body: &[u8]) -> IoResult<Vec<u8>> {
    let mut frame = bincode::serde::encode_to_vec(header, header_config())
        .map_err(|e| IoError::InvalidHeader {
            reason: e.to_string(),
        })?;
    frame.extend_from_slice(body);
    Ok(frame)
}

/// Split a frame back into header and body
pub fn decode_envelope(frame: Bytes) -> IoResult<(MessageHeader, Bytes)> {
    let (header, consumed): (MessageHeader, usize) =
        bincode::serde::decode_from_slice(&frame, header_config()).map_err(|e| {
            IoError::InvalidHeader {
                reason: e.to_string(),
            }
        })?;
    Ok((header, frame.slice(consumed..)))
}

/// Reads envelopes off a stream, ready for dispatch
#[derive(Debug)]
pub struct EnvelopeReader<R> {
    reader: MessageReader<R>,
}

impl<R: AsyncRead + Unpin> EnvelopeReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, &SessionConfig::default())
    }

    pub fn with_config(reader: R, config: &SessionConfig) -> Self {
        let framer = LengthPrefixedFramer::new().with_max_frame_size(config.max_frame_size);
        Self {
            reader: MessageReader::with_framer(reader, framer, config.read_buffer_size),
        }
    }

    pub async fn next_envelope(&mut self) -> IoResult<(MessageHeader, Bytes)> {
        let frame = self.reader.read_message().await?;
        let (header, body) = decode_envelope(frame)?;
        trace!(
            protocol = header.protocol,
            message_type = header.message_type,
            message_id = header.message_id,
            correlation_id = header.correlation_id,
            "envelope received"
        );
        Ok((header, body))
    }

    /// Read one envelope and hand it to `handlers`
    pub async fn dispatch_next(&mut self, handlers: &HandlerSet) -> ExchangeResult<DispatchOutcome> {
        let (header, body) = self.next_envelope().await?;
        handlers.dispatch(&header, &body).await
    }
}
