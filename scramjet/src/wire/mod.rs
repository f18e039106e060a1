//! Wire format for jet messages.
//!
//! Frame format: `[length:4][type:1][body:N]`
//!
//! - **length**: Payload size in bytes, type tag included (little-endian u32).
//!   The prefix itself is not counted.
//! - **type**: Message type tag, see [`MessageType`].
//! - **body**: Type-specific content.

mod reader;

pub use reader::FrameReader;

use bytes::Bytes;

/// Size of the length prefix preceding every payload.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Size of the message type tag at the front of every payload.
pub const TYPE_TAG_SIZE: usize = 1;

/// Default maximum payload size (1MB).
///
/// Frames declaring more than this are rejected before any payload byte is
/// buffered.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Framing error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FramingError {
    /// Not enough bytes to decode a fixed-size record.
    #[error("truncated input: need {needed} bytes, have {have}")]
    TruncatedInput {
        /// Bytes required.
        needed: usize,
        /// Bytes available.
        have: usize,
    },

    /// The transport failed before a complete length prefix arrived.
    #[error("failed to read length prefix: {reason}")]
    LengthReadFailed {
        /// What the transport reported.
        reason: String,
    },

    /// The transport failed while the payload was being accumulated.
    #[error("failed to read payload: {reason}")]
    PayloadReadFailed {
        /// What the transport reported.
        reason: String,
    },

    /// A length prefix of zero: no room for the type tag.
    #[error("empty frame")]
    EmptyFrame,

    /// Declared payload exceeds the configured maximum.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Declared or requested payload size.
        size: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The transport failed while an outbound frame was being written.
    #[error("failed to write frame: {reason}")]
    WriteFailed {
        /// What the transport reported.
        reason: String,
    },
}

/// Message types known to the framing and version-gate layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Version announcement; body is a 12-byte [`Version`](crate::Version).
    ApiVersion = 1,
}

impl MessageType {
    /// Map a raw tag to a known message type.
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::ApiVersion),
            _ => None,
        }
    }

    /// Raw wire tag.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One length-delimited message: a type tag followed by its body.
///
/// The payload is never empty; [`FrameReader`] rejects zero-length frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Bytes,
}

impl Frame {
    /// Build a frame from a tag and body.
    pub fn new(message_type: u8, body: &[u8]) -> Self {
        let mut payload = Vec::with_capacity(TYPE_TAG_SIZE + body.len());
        payload.push(message_type);
        payload.extend_from_slice(body);
        Self {
            payload: Bytes::from(payload),
        }
    }

    /// Wrap a decoded payload. Caller guarantees it is non-empty.
    pub(crate) fn from_payload(payload: Bytes) -> Self {
        debug_assert!(!payload.is_empty());
        Self { payload }
    }

    /// Raw message type tag.
    pub fn message_type(&self) -> u8 {
        self.payload[0]
    }

    /// Known message type, if the tag is recognised.
    pub fn kind(&self) -> Option<MessageType> {
        MessageType::from_u8(self.message_type())
    }

    /// Body following the type tag.
    pub fn body(&self) -> &[u8] {
        &self.payload[TYPE_TAG_SIZE..]
    }

    /// Full payload (tag + body), as counted by the length prefix.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Encode one frame: `[length:4][type:1][body:N]`.
///
/// # Errors
///
/// Returns `FrameTooLarge` if tag + body exceed `max_frame_size`.
///
/// # Examples
///
/// ```
/// use scramjet::wire::{encode_frame, MAX_FRAME_SIZE};
///
/// let bytes = encode_frame(1, &[0xAA, 0xBB], MAX_FRAME_SIZE).expect("encode");
/// assert_eq!(bytes, vec![3, 0, 0, 0, 1, 0xAA, 0xBB]);
/// ```
pub fn encode_frame(
    message_type: u8,
    body: &[u8],
    max_frame_size: usize,
) -> Result<Vec<u8>, FramingError> {
    let payload_len = TYPE_TAG_SIZE + body.len();
    if payload_len > max_frame_size || payload_len > u32::MAX as usize {
        return Err(FramingError::FrameTooLarge {
            size: payload_len,
            max: max_frame_size,
        });
    }

    let mut data = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload_len);
    data.extend_from_slice(&(payload_len as u32).to_le_bytes());
    data.push(message_type);
    data.extend_from_slice(body);
    Ok(data)
}
