//! Reporting of stream conditions that are recovered from locally.
//!
//! Nothing here is fatal: the framer is already back to waiting for a header
//! by the time a sink hears about a problem.

use crate::{frame::Frame, framer::Overflow, telemetry::DecodeError};

/// Receives everything the [`Monitor`](crate::Monitor) does not turn into a
/// snapshot. All methods default to doing nothing.
pub trait DiagnosticSink {
    /// A byte seen outside of any frame.
    fn passthrough(&mut self, _byte: u8) {}

    /// A partial frame dropped because it outgrew the accumulator.
    fn overflow(&mut self, _overflow: &Overflow) {}

    /// A complete frame of a kind that is not decoded.
    fn unrecognized(&mut self, _frame: &Frame) {}

    fn decode_error(&mut self, _frame: &Frame, _error: &DecodeError) {}
}

/// Discards everything.
impl DiagnosticSink for () {}

/// Forwards diagnostics to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn passthrough(&mut self, byte: u8) {
        log::trace!("{:02x}", byte);
    }

    fn overflow(&mut self, overflow: &Overflow) {
        log::warn!(
            "message buffer full, discarded {} bytes: {:02x?}",
            overflow.len(),
            overflow.bytes()
        );
    }

    fn unrecognized(&mut self, frame: &Frame) {
        log::debug!(
            "type 0x{:02x}, length={}, data={:02x?}",
            frame.kind(),
            frame.declared_length(),
            frame.payload()
        );
    }

    fn decode_error(&mut self, frame: &Frame, error: &DecodeError) {
        log::warn!("{:?} in frame {:02x?}", error, frame.as_bytes());
    }
}
