//! Streaming decoder for the STWBC2 wireless power transmitter's serial
//! monitor protocol.
//!
//! Bytes go into a [`Framer`] one at a time, complete frames come out and are
//! turned into a [`Telemetry`] snapshot by [`decode`]. [`Monitor`] bundles the
//! two with a [`DiagnosticSink`] and adapts non-blocking byte sources.
#![no_std]

pub mod diagnostics;
pub mod frame;
pub mod framer;
pub mod layout;
pub mod monitor;
pub mod telemetry;

pub trait Encode {
    type Error;

    /// Write `self` to the front of `buffer`, returning the number of bytes used.
    fn encode(&self, buffer: &mut [u8]) -> Result<usize, Self::Error>;
}

pub trait Decode<'a> where Self: Sized {
    type Error;

    fn decode(data: &'a [u8]) -> Result<Self, Self::Error>;
}

pub use diagnostics::{DiagnosticSink, LogSink};
pub use frame::{Frame, FrameError, MessageType};
pub use framer::{FrameEvent, Framer, Overflow};
pub use monitor::Monitor;
pub use telemetry::{ChargerState, DecodeError, MonitorMessage, Telemetry, decode};
