//! Incremental frame decoding over a byte stream.

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::{Frame, FramingError, LENGTH_PREFIX_SIZE};

/// Read size while waiting for a length prefix.
///
/// Back-to-back frames delivered by one underlying read stay buffered and
/// are decoded in turn.
const READ_CHUNK_SIZE: usize = 4096;

/// Accumulates transport bytes and cuts them into [`Frame`]s.
///
/// State is a receive buffer plus the length of the frame currently being
/// assembled. Bytes are consumed strictly in order; surplus bytes after a
/// complete frame stay buffered for the next call.
///
/// [`read_frame`](Self::read_frame) is cancel-safe: all progress lives in
/// `self`, so dropping the future mid-read loses nothing.
#[derive(Debug)]
pub struct FrameReader {
    buffer: BytesMut,
    /// Declared payload length once the prefix has been consumed.
    pending_len: Option<usize>,
    max_frame_size: usize,
}

impl FrameReader {
    /// Create a reader enforcing `max_frame_size` on declared lengths.
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(READ_CHUNK_SIZE),
            pending_len: None,
            max_frame_size,
        }
    }

    /// Bytes read from the transport but not yet part of an emitted frame,
    /// excluding an already-consumed length prefix.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Whether a length prefix has been consumed and its payload is pending.
    pub fn is_mid_frame(&self) -> bool {
        self.pending_len.is_some()
    }

    /// Decode one frame from already-buffered bytes, without reading.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(frame))` if a complete frame was buffered
    /// - `Ok(None)` if more data is needed (not an error condition)
    /// - `Err` if the declared length is zero or above the maximum
    pub fn try_decode(&mut self) -> Result<Option<Frame>, FramingError> {
        let length = match self.pending_len {
            Some(length) => length,
            None => {
                if self.buffer.len() < LENGTH_PREFIX_SIZE {
                    return Ok(None);
                }

                let length = self.buffer.get_u32_le() as usize;
                if length == 0 {
                    return Err(FramingError::EmptyFrame);
                }
                if length > self.max_frame_size {
                    return Err(FramingError::FrameTooLarge {
                        size: length,
                        max: self.max_frame_size,
                    });
                }

                tracing::trace!("frame reader: length prefix decoded, expecting {} bytes", length);
                self.pending_len = Some(length);
                length
            }
        };

        if self.buffer.len() < length {
            self.buffer.reserve(length - self.buffer.len());
            return Ok(None);
        }

        let payload = self.buffer.split_to(length).freeze();
        self.pending_len = None;
        Ok(Some(Frame::from_payload(payload)))
    }

    /// Read from `stream` until one complete frame is available.
    ///
    /// While waiting for a prefix, reads up to a chunk at a time; while
    /// accumulating a payload, each read asks for exactly the shortfall.
    ///
    /// # Errors
    ///
    /// - `LengthReadFailed` if the transport fails or closes before the
    ///   length prefix is complete
    /// - `PayloadReadFailed` if it fails or closes mid-payload
    /// - `EmptyFrame` / `FrameTooLarge` for an unacceptable declared length
    ///
    /// After any error the reader must not be reused; the connection is
    /// unusable.
    pub async fn read_frame<R>(&mut self, stream: &mut R) -> Result<Frame, FramingError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        loop {
            if let Some(frame) = self.try_decode()? {
                tracing::trace!(
                    "frame reader: emitting frame type={} len={}, {} bytes still buffered",
                    frame.message_type(),
                    frame.len(),
                    self.buffer.len()
                );
                return Ok(frame);
            }

            let want = match self.pending_len {
                Some(length) => length - self.buffer.len(),
                None => READ_CHUNK_SIZE,
            };
            self.buffer.reserve(want);

            let read = (&mut *stream)
                .take(want as u64)
                .read_buf(&mut self.buffer)
                .await;

            match read {
                Ok(0) => return Err(self.read_failure("connection closed by peer".to_string())),
                Ok(n) => {
                    tracing::trace!(
                        "frame reader: received {} bytes, buffer now {} bytes",
                        n,
                        self.buffer.len()
                    );
                }
                Err(e) => return Err(self.read_failure(e.to_string())),
            }
        }
    }

    fn read_failure(&self, reason: String) -> FramingError {
        if self.pending_len.is_some() {
            FramingError::PayloadReadFailed { reason }
        } else {
            FramingError::LengthReadFailed { reason }
        }
    }
}
