use crate::{
    Decode, Encode,
    layout::{
        FRAME_HEADER_LENGTH, HEADER, LENGTH_OFFSET, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE, TYPE_MONITOR,
        TYPE_OFFSET,
    },
};

/// Backing storage of a frame. Never larger than the accumulator.
pub type FrameBytes = heapless::Vec<u8, MAX_FRAME_SIZE>;

/// Message kinds found in the type byte of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Monitor,
    Unrecognized(u8),
}

impl From<u8> for MessageType {
    fn from(value: u8) -> Self {
        match value {
            TYPE_MONITOR => MessageType::Monitor,
            other => MessageType::Unrecognized(other),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(value: MessageType) -> Self {
        match value {
            MessageType::Monitor => TYPE_MONITOR,
            MessageType::Unrecognized(other) => other,
        }
    }
}

/// A structurally complete frame: header, type, length and exactly
/// `length` payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: FrameBytes,
}

/// Error type for encoding and decoding Frames
#[derive(Debug, PartialEq, Eq)]
pub enum FrameError {
    MissingHeader {
        found: u8,
    },
    DecodeBufferTooSmall {
        expected_at_least: usize,
        found: usize,
    },
    EncodeBufferTooSmall {
        expected: usize,
        found: usize,
    },
    PayloadTooLong {
        length: usize,
    },
}

impl Frame {
    /// Build a frame around `payload`.
    pub fn new(kind: impl Into<u8>, payload: &[u8]) -> Result<Frame, FrameError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLong {
                length: payload.len(),
            });
        }
        let mut bytes = FrameBytes::new();
        // Cannot overflow, the payload was checked against the capacity above
        let _ = bytes.extend_from_slice(&[HEADER, kind.into(), payload.len() as u8]);
        let _ = bytes.extend_from_slice(payload);
        Ok(Frame { bytes })
    }

    /// Wrap accumulator contents the framer has already length-checked.
    pub(crate) fn from_complete(bytes: FrameBytes) -> Frame {
        Frame { bytes }
    }

    pub fn kind(&self) -> u8 {
        self.bytes[TYPE_OFFSET]
    }

    pub fn message_type(&self) -> MessageType {
        MessageType::from(self.kind())
    }

    /// Payload length as declared on the wire.
    pub fn declared_length(&self) -> u8 {
        self.bytes[LENGTH_OFFSET]
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[FRAME_HEADER_LENGTH..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length in a slice this frame occupies, header bytes included
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a frame with no payload.
    pub fn is_empty(&self) -> bool {
        self.payload().is_empty()
    }
}

impl Encode for Frame {
    type Error = FrameError;

    fn encode(&self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        if buffer.len() < self.len() {
            return Err(FrameError::EncodeBufferTooSmall {
                expected: self.len(),
                found: buffer.len(),
            });
        }
        buffer[0..self.len()].copy_from_slice(&self.bytes);
        Ok(self.len())
    }
}

impl<'a> Decode<'a> for Frame {
    type Error = FrameError;

    /// Parse the frame at the start of `data`. Bytes past the declared
    /// length are not part of the frame and are ignored.
    fn decode(data: &'a [u8]) -> Result<Self, Self::Error> {
        if data.len() < FRAME_HEADER_LENGTH {
            return Err(FrameError::DecodeBufferTooSmall {
                expected_at_least: FRAME_HEADER_LENGTH,
                found: data.len(),
            });
        }
        if data[0] != HEADER {
            return Err(FrameError::MissingHeader { found: data[0] });
        }
        let size = data[LENGTH_OFFSET] as usize + FRAME_HEADER_LENGTH;
        if size > MAX_FRAME_SIZE {
            return Err(FrameError::PayloadTooLong {
                length: data[LENGTH_OFFSET] as usize,
            });
        }
        if data.len() < size {
            return Err(FrameError::DecodeBufferTooSmall {
                expected_at_least: size,
                found: data.len(),
            });
        }
        let bytes = FrameBytes::from_slice(&data[0..size])
            .map_err(|_| FrameError::PayloadTooLong { length: size })?;
        Ok(Frame { bytes })
    }
}
