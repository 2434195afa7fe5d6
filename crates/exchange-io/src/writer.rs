use crate::error::{IoError, IoResult};
use crate::framer::LengthPrefixedFramer;
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

/// A buffered writer of length-prefixed frames.
///
/// Frames accumulate in a write buffer and reach the underlying writer on
/// `flush`, or as soon as the buffer passes the auto-flush threshold.
///
/// A failed flush drops whatever was still buffered. If part of the buffer
/// had already gone out the stream is left mid-frame, so the writer refuses
/// every later message with `StreamClosed`.
///
/// # Type Parameters
/// * `W` - Any `AsyncWrite` (TCP stream, duplex pipe, ...)
#[derive(Debug)]
pub struct MessageWriter<W> {
    inner: W,
    framer: LengthPrefixedFramer,
    write_buffer: BytesMut,
    broken: bool,

    /// Flush when the buffer reaches this size; 0 flushes every message
    auto_flush_threshold: usize,

    messages_written: u64,
    /// Including framing overhead
    bytes_written: u64,
}

impl<W> MessageWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// 8KB buffer, 4KB auto-flush threshold
    pub fn new(writer: W) -> Self {
        Self::with_buffer_size(writer, 8192, 4096)
    }

    pub fn with_buffer_size(writer: W, buffer_capacity: usize, auto_flush_threshold: usize) -> Self {
        Self {
            inner: writer,
            framer: LengthPrefixedFramer::new(),
            write_buffer: BytesMut::with_capacity(buffer_capacity),
            broken: false,
            auto_flush_threshold,
            messages_written: 0,
            bytes_written: 0,
        }
    }

    /// Writer that flushes every message as it is written
    pub fn immediate_flush(writer: W) -> Self {
        Self::with_buffer_size(writer, 1024, 0)
    }

    pub fn with_framer(mut self, framer: LengthPrefixedFramer) -> Self {
        self.framer = framer;
        self
    }

    /// Frame `message` and buffer it, flushing if the threshold is reached
    pub async fn write_message(&mut self, message: &[u8]) -> IoResult<()> {
        if self.broken {
            return Err(IoError::StreamClosed);
        }
        let framed = self.framer.frame_message(message)?;
        self.write_buffer.extend_from_slice(&framed);

        self.messages_written += 1;
        self.bytes_written += framed.len() as u64;

        if self.auto_flush_threshold == 0 || self.write_buffer.len() >= self.auto_flush_threshold {
            self.flush().await?;
        }

        Ok(())
    }

    /// Write everything buffered to the underlying writer and flush it
    pub async fn flush(&mut self) -> IoResult<()> {
        let pending = self.write_buffer.len();
        if let Err(error) = self.drain().await {
            let unsent = self.write_buffer.len();
            self.write_buffer.clear();
            if unsent < pending {
                self.broken = true;
            }
            warn!(
                pending,
                unsent,
                broken = self.broken,
                error = %error,
                "flush failed, buffered frames dropped"
            );
            return Err(error);
        }
        Ok(())
    }

    async fn drain(&mut self) -> IoResult<()> {
        while !self.write_buffer.is_empty() {
            let written = self.inner.write(&self.write_buffer).await?;

            if written == 0 {
                return Err(IoError::SendFailed {
                    bytes: self.write_buffer.len(),
                    reason: "underlying writer accepted no bytes".to_string(),
                });
            }

            self.write_buffer.advance(written);
        }

        self.inner.flush().await?;
        Ok(())
    }

    /// `write_message` followed by `flush`
    pub async fn write_immediate(&mut self, message: &[u8]) -> IoResult<()> {
        self.write_message(message).await?;
        self.flush().await
    }

    /// Number of bytes waiting to be flushed
    pub fn buffer_size(&self) -> usize {
        self.write_buffer.len()
    }

    pub fn is_buffer_empty(&self) -> bool {
        self.write_buffer.is_empty()
    }

    pub fn auto_flush_threshold(&self) -> usize {
        self.auto_flush_threshold
    }

    /// (messages_written, bytes_written)
    pub fn stats(&self) -> (u64, u64) {
        (self.messages_written, self.bytes_written)
    }

    /// Whether a failed flush left a partial frame on the stream
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

impl<W> Drop for MessageWriter<W> {
    fn drop(&mut self) {
        if !self.write_buffer.is_empty() {
            warn!(
                unflushed = self.write_buffer.len(),
                "message writer dropped with unflushed data"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::MessageReader;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::DuplexStream;

    /// Accepts `budget` bytes, then fails every write
    struct Choking {
        accepted: Vec<u8>,
        budget: usize,
    }

    impl AsyncWrite for Choking {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            if self.budget == 0 {
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "choked")));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            self.accepted.extend_from_slice(&buf[..n]);
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn create_test_streams() -> (DuplexStream, DuplexStream) {
        tokio::io::duplex(1024)
    }

    #[tokio::test]
    async fn written_message_reads_back() {
        let (writer_stream, reader_stream) = create_test_streams();
        let mut writer = MessageWriter::new(writer_stream);
        let mut reader = MessageReader::new(reader_stream);

        writer.write_message(b"Hello, World!").await.unwrap();
        assert_eq!(writer.buffer_size(), 13 + 4);
        writer.flush().await.unwrap();

        let received = reader.read_message().await.unwrap();
        assert_eq!(&received[..], b"Hello, World!");
        assert_eq!(writer.stats(), (1, 13 + 4));
    }

    #[tokio::test]
    async fn threshold_triggers_flush() {
        let (writer_stream, reader_stream) = create_test_streams();
        let mut writer = MessageWriter::with_buffer_size(writer_stream, 1024, 10);
        let mut reader = MessageReader::new(reader_stream);

        let large_message = vec![b'x'; 20];
        writer.write_message(&large_message).await.unwrap();
        assert!(writer.is_buffer_empty());

        let received = reader.read_message().await.unwrap();
        assert_eq!(received.to_vec(), large_message);
    }

    #[tokio::test]
    async fn immediate_flush_leaves_nothing_buffered() {
        let (writer_stream, reader_stream) = create_test_streams();
        let mut writer = MessageWriter::immediate_flush(writer_stream);
        let mut reader = MessageReader::new(reader_stream);

        for message in [&b"one"[..], b"two", b"three"] {
            writer.write_message(message).await.unwrap();
            assert!(writer.is_buffer_empty());
        }

        for expected in [&b"one"[..], b"two", b"three"] {
            assert_eq!(&reader.read_message().await.unwrap()[..], expected);
        }
    }

    #[tokio::test]
    async fn failed_flush_drops_the_frame_and_breaks_the_writer() {
        let mut writer = MessageWriter::immediate_flush(Choking {
            accepted: Vec::new(),
            budget: 6,
        });

        assert!(writer.write_message(b"first message").await.is_err());
        assert!(writer.is_buffer_empty());
        assert!(writer.is_broken());

        let err = writer.write_message(b"second").await.unwrap_err();
        assert!(matches!(err, IoError::StreamClosed));
        assert_eq!(writer.get_ref().accepted.len(), 6);
    }

    #[tokio::test]
    async fn refused_flush_keeps_the_writer_usable() {
        let mut writer = MessageWriter::immediate_flush(Choking {
            accepted: Vec::new(),
            budget: 0,
        });

        assert!(writer.write_message(b"first").await.is_err());
        assert!(writer.is_buffer_empty());
        assert!(!writer.is_broken());

        writer.inner.budget = 64;
        writer.write_message(b"second").await.unwrap();

        let mut expected = 6u32.to_le_bytes().to_vec();
        expected.extend_from_slice(b"second");
        assert_eq!(writer.get_ref().accepted, expected);
    }

    #[tokio::test]
    async fn oversized_message_is_not_buffered() {
        let (stream, _) = create_test_streams();
        let mut writer = MessageWriter::new(stream)
            .with_framer(LengthPrefixedFramer::new().with_max_frame_size(4));

        let err = writer.write_message(b"too long").await.unwrap_err();
        assert!(matches!(err, IoError::FrameTooLarge { .. }));
        assert!(writer.is_buffer_empty());
        assert_eq!(writer.stats(), (0, 0));
    }
}
