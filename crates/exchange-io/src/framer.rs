use crate::error::{IoError, IoResult};
use bytes::{Bytes, BytesMut};
use exchange_core::MAX_MESSAGE_SIZE;

/// Splits a byte stream into length-prefixed frames and frames outgoing
/// messages the same way. The prefix is a little-endian `u32`.
#[derive(Debug, Clone)]
pub struct LengthPrefixedFramer {
    state: FrameState,
    buffer: BytesMut,
    max_frame_size: usize,
}

#[derive(Debug, Clone, Copy)]
enum FrameState {
    ReadingLength,
    ReadingFrame(usize),
}

impl LengthPrefixedFramer {
    pub fn new() -> Self {
        Self::with_capacity(8192)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: FrameState::ReadingLength,
            buffer: BytesMut::with_capacity(capacity),
            max_frame_size: MAX_MESSAGE_SIZE,
        }
    }

    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Feed received bytes; returns every frame they complete.
    ///
    /// A length prefix above the limit is an error and leaves the framer
    /// unusable for this stream.
    pub fn process_bytes(&mut self, input: &[u8]) -> IoResult<Vec<Bytes>> {
        self.buffer.extend_from_slice(input);
        let mut frames = Vec::new();

        loop {
            match self.state {
                FrameState::ReadingLength => {
                    if self.buffer.len() < 4 {
                        break;
                    }
                    let prefix = self.buffer.split_to(4);
                    let size =
                        u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
                    if size > self.max_frame_size {
                        return Err(IoError::FrameTooLarge {
                            size,
                            max: self.max_frame_size,
                        });
                    }
                    self.state = FrameState::ReadingFrame(size);
                }

                FrameState::ReadingFrame(size) => {
                    if self.buffer.len() < size {
                        break;
                    }
                    frames.push(self.buffer.split_to(size).freeze());
                    self.state = FrameState::ReadingLength;
                }
            }
        }

        Ok(frames)
    }

    /// Prefix `message` with its length
    pub fn frame_message(&self, message: &[u8]) -> IoResult<Vec<u8>> {
        if message.len() > self.max_frame_size {
            return Err(IoError::FrameTooLarge {
                size: message.len(),
                max: self.max_frame_size,
            });
        }
        let mut framed = Vec::with_capacity(4 + message.len());
        framed.extend_from_slice(&(message.len() as u32).to_le_bytes());
        framed.extend_from_slice(message);
        Ok(framed)
    }

    /// Whether a frame has been started but not completed
    pub fn has_partial_frame(&self) -> bool {
        match self.state {
            FrameState::ReadingLength => !self.buffer.is_empty(),
            FrameState::ReadingFrame(_) => true,
        }
    }
}

impl Default for LengthPrefixedFramer {
    fn default() -> Self {
        Self::new()
    }
}
