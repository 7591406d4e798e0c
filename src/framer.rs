//! Frame boundary detection over a raw byte stream.
//!
//! There is no escaping and no checksum on the wire: a header byte always
//! starts a new frame, even in the middle of one, and a frame is complete as
//! soon as `length + 3` bytes have been collected. A frame that would not fit
//! the accumulator is dropped and scanning resumes at the next header.

use core::mem;

use crate::{
    frame::{Frame, FrameBytes},
    layout::{FRAME_HEADER_LENGTH, HEADER, LENGTH_OFFSET},
};

/// Outcome of feeding one byte.
#[derive(Debug, PartialEq)]
pub enum FrameEvent {
    /// Byte was buffered, the frame needs more.
    Pending,
    /// Byte arrived outside of any frame and was not buffered.
    Passthrough(u8),
    FrameReady(Frame),
    BufferOverflow(Overflow),
}

/// Bytes of a partial frame dropped because the accumulator filled up.
#[derive(Debug, Clone, PartialEq)]
pub struct Overflow {
    discarded: FrameBytes,
}

impl Overflow {
    pub fn bytes(&self) -> &[u8] {
        &self.discarded
    }

    pub fn len(&self) -> usize {
        self.discarded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.discarded.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Framer {
    buf: FrameBytes,
    collecting: bool,
}

impl Framer {
    pub const fn new() -> Framer {
        Framer {
            buf: FrameBytes::new(),
            collecting: false,
        }
    }

    pub fn feed(&mut self, byte: u8) -> FrameEvent {
        if byte == HEADER {
            if self.collecting && self.buf.len() > 1 {
                log::debug!("header mid-frame, dropping {} partial bytes", self.buf.len());
            }
            self.buf.clear();
            // Buffer was just cleared
            let _ = self.buf.push(byte);
            self.collecting = true;
            return FrameEvent::Pending;
        }

        if !self.collecting {
            return FrameEvent::Passthrough(byte);
        }

        if self.buf.push(byte).is_err() {
            return self.overflow();
        }

        if self.buf.len() >= FRAME_HEADER_LENGTH {
            let expected = self.buf[LENGTH_OFFSET] as usize + FRAME_HEADER_LENGTH;
            if self.buf.len() >= expected {
                let bytes = mem::take(&mut self.buf);
                self.collecting = false;
                return FrameEvent::FrameReady(Frame::from_complete(bytes));
            }
        }

        // Full and still incomplete, no later byte can finish this frame
        if self.buf.is_full() {
            return self.overflow();
        }
        FrameEvent::Pending
    }

    fn overflow(&mut self) -> FrameEvent {
        let discarded = mem::take(&mut self.buf);
        self.collecting = false;
        FrameEvent::BufferOverflow(Overflow { discarded })
    }

    /// True while bytes are being collected into a frame
    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    /// The partial frame collected so far.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Drop any partial frame and wait for the next header.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.collecting = false;
    }
}
