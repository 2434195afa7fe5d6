use crate::error::{IoError, IoResult};
use crate::framer::LengthPrefixedFramer;
use bytes::Bytes;
use std::collections::VecDeque;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Reads length-prefixed frames from a stream
#[derive(Debug)]
pub struct MessageReader<R> {
    inner: R,
    framer: LengthPrefixedFramer,
    read_buffer: Vec<u8>,
    /// Frames already completed by an earlier read
    pending: VecDeque<Bytes>,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_framer(reader, LengthPrefixedFramer::new(), 8192)
    }

    pub fn with_framer(reader: R, framer: LengthPrefixedFramer, read_buffer_size: usize) -> Self {
        Self {
            inner: reader,
            framer,
            read_buffer: vec![0; read_buffer_size.max(1)],
            pending: VecDeque::new(),
        }
    }

    /// Next complete frame. End of stream is `StreamClosed`, also when it
    /// cuts a frame short.
    pub async fn read_message(&mut self) -> IoResult<Bytes> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(frame);
            }

            let read = self.inner.read(&mut self.read_buffer).await?;
            if read == 0 {
                return Err(IoError::StreamClosed);
            }

            let frames = self.framer.process_bytes(&self.read_buffer[..read])?;
            self.pending.extend(frames);
        }
    }

    /// A frame that is already complete, without reading
    pub fn try_read_message(&mut self) -> Option<Bytes> {
        self.pending.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn closed_stream_reports_stream_closed() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut reader = MessageReader::new(reader);

        // Half a frame, then close
        writer.write_all(&[5, 0, 0, 0, b'a']).await.unwrap();
        drop(writer);

        let err = reader.read_message().await.unwrap_err();
        assert!(matches!(err, IoError::StreamClosed));
        assert!(err.is_closed());
    }

    #[tokio::test]
    async fn several_frames_in_one_read_are_all_delivered() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut reader = MessageReader::new(reader);
        let framer = LengthPrefixedFramer::new();

        let mut bytes = framer.frame_message(b"a").unwrap();
        bytes.extend(framer.frame_message(b"bc").unwrap());
        writer.write_all(&bytes).await.unwrap();

        assert_eq!(&reader.read_message().await.unwrap()[..], b"a");
        assert_eq!(reader.try_read_message(), Some(Bytes::from_static(b"bc")));
        assert_eq!(reader.try_read_message(), None);
    }
}
