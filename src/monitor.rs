//! Owned decoding context and byte source adapters.

use embedded_hal_nb::serial::Read;
use embedded_io::ReadReady;

use crate::{
    diagnostics::{DiagnosticSink, LogSink},
    framer::{FrameEvent, Framer},
    telemetry::{Telemetry, decode},
};

/// Chunk size used when draining an `embedded_io` reader.
const READ_CHUNK: usize = 32;

/// Framer, latest snapshot and diagnostic sink for one serial link.
///
/// The snapshot is overwritten in place by every decoded monitor message and
/// is left untouched by anything else.
#[derive(Debug, Default)]
pub struct Monitor<S: DiagnosticSink = LogSink> {
    framer: Framer,
    telemetry: Telemetry,
    updates: u32,
    sink: S,
}

impl Monitor<LogSink> {
    pub fn new() -> Monitor<LogSink> {
        Monitor::with_sink(LogSink)
    }
}

impl<S: DiagnosticSink> Monitor<S> {
    pub fn with_sink(sink: S) -> Monitor<S> {
        Monitor {
            framer: Framer::new(),
            telemetry: Telemetry::default(),
            updates: 0,
            sink,
        }
    }

    /// Run one byte through the framer and decoder. Returns the snapshot if
    /// this byte completed a monitor message.
    pub fn process(&mut self, byte: u8) -> Option<&Telemetry> {
        match self.framer.feed(byte) {
            FrameEvent::Pending => None,
            FrameEvent::Passthrough(b) => {
                self.sink.passthrough(b);
                None
            }
            FrameEvent::BufferOverflow(o) => {
                self.sink.overflow(&o);
                None
            }
            FrameEvent::FrameReady(frame) => match decode(&frame) {
                Ok(Some(t)) => {
                    self.telemetry = t;
                    self.updates = self.updates.wrapping_add(1);
                    Some(&self.telemetry)
                }
                Ok(None) => {
                    self.sink.unrecognized(&frame);
                    None
                }
                Err(e) => {
                    self.sink.decode_error(&frame, &e);
                    None
                }
            },
        }
    }

    /// Process every byte of `data`, returning how many snapshots were decoded.
    pub fn process_all(&mut self, data: &[u8]) -> usize {
        data.iter()
            .filter(|b| self.process(**b).is_some())
            .count()
    }

    /// Take one byte from a non-blocking serial receiver.
    ///
    /// `WouldBlock` means no byte was available; call again later.
    pub fn poll<Rx: Read<u8>>(&mut self, rx: &mut Rx) -> nb::Result<Option<&Telemetry>, Rx::Error> {
        let byte = rx.read()?;
        Ok(self.process(byte))
    }

    /// Read from `reader` for as long as it reports data ready, returning how
    /// many snapshots were decoded.
    pub fn pump<R>(&mut self, reader: &mut R) -> Result<usize, R::Error>
    where
        R: embedded_io::Read + ReadReady,
    {
        let mut buf = [0u8; READ_CHUNK];
        let mut decoded = 0;
        while reader.read_ready()? {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            decoded += self.process_all(&buf[0..n]);
        }
        Ok(decoded)
    }

    /// Latest snapshot. All zero until the first monitor message.
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Number of monitor messages decoded so far.
    pub fn updates(&self) -> u32 {
        self.updates
    }

    pub fn framer(&self) -> &Framer {
        &self.framer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use core::convert::Infallible;

    use alloc::{collections::VecDeque, vec::Vec};
    use embedded_hal_nb::serial::ErrorType;

    use super::*;
    use crate::{
        frame::Frame,
        framer::Overflow,
        layout::{HEADER, MAX_FRAME_SIZE, TYPE_MONITOR},
        telemetry::DecodeError,
    };

    #[derive(Debug, Default)]
    struct Recorder {
        passthrough: Vec<u8>,
        overflows: Vec<usize>,
        unrecognized: Vec<u8>,
        errors: Vec<DecodeError>,
    }

    impl DiagnosticSink for Recorder {
        fn passthrough(&mut self, byte: u8) {
            self.passthrough.push(byte);
        }

        fn overflow(&mut self, overflow: &Overflow) {
            self.overflows.push(overflow.len());
        }

        fn unrecognized(&mut self, frame: &Frame) {
            self.unrecognized.push(frame.kind());
        }

        fn decode_error(&mut self, _frame: &Frame, error: &DecodeError) {
            self.errors.push(*error);
        }
    }

    #[derive(Debug)]
    struct ReadBuffer(VecDeque<u8>);

    impl ErrorType for ReadBuffer {
        type Error = Infallible;
    }

    impl Read for ReadBuffer {
        fn read(&mut self) -> nb::Result<u8, Self::Error> {
            self.0.pop_front().ok_or(nb::Error::WouldBlock)
        }
    }

    /// Hands out at most `chunk` bytes per read.
    struct ChunkReader<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl embedded_io::ErrorType for ChunkReader<'_> {
        type Error = Infallible;
    }

    impl embedded_io::Read for ChunkReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[0..n].copy_from_slice(&self.data[0..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    impl ReadReady for ChunkReader<'_> {
        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.data.is_empty())
        }
    }

    fn sample() -> Telemetry {
        Telemetry {
            state: 0x0B,
            frequency: 145_000,
            control_error: 2,
            duty_cycle: 0.5,
            bridge_voltage: 5.0,
            rx_power: 2.5,
            input_voltage: 12.0,
        }
    }

    fn wire(t: &Telemetry) -> Vec<u8> {
        Vec::from(t.to_frame().unwrap().as_bytes())
    }

    #[test]
    fn decodes_stream_with_noise() {
        let mut m = Monitor::with_sink(Recorder::default());
        let mut data = Vec::from([0x01, 0x02]);
        data.extend(wire(&sample()));
        data.push(0x03);

        assert_eq!(m.process_all(&data), 1);
        assert_eq!(m.telemetry(), &sample());
        assert_eq!(m.updates(), 1);
        assert_eq!(m.sink().passthrough, [0x01, 0x02, 0x03]);
    }

    #[test]
    fn process_returns_snapshot_on_last_byte() {
        let mut m = Monitor::with_sink(());
        let data = wire(&sample());
        let (last, head) = data.split_last().unwrap();
        for b in head {
            assert!(m.process(*b).is_none());
        }
        assert_eq!(m.process(*last), Some(&sample()));
    }

    #[test]
    fn snapshot_is_overwritten_wholesale() {
        let mut m = Monitor::with_sink(());
        m.process_all(&wire(&sample()));
        let second = Telemetry {
            state: 0x04,
            ..Telemetry::default()
        };
        m.process_all(&wire(&second));
        assert_eq!(m.telemetry(), &second);
        assert_eq!(m.updates(), 2);
    }

    #[test]
    fn unrecognized_and_malformed_leave_snapshot() {
        let mut m = Monitor::with_sink(Recorder::default());
        m.process_all(&wire(&sample()));

        m.process_all(&[HEADER, 0xFF, 0x00]);
        m.process_all(&[HEADER, TYPE_MONITOR, 0x00]);
        m.process_all(&[HEADER, TYPE_MONITOR, 0x02, 0x0C, 0x00]);

        assert_eq!(m.telemetry(), &sample());
        assert_eq!(m.updates(), 1);
        assert_eq!(m.sink().unrecognized, [0xFF]);
        assert_eq!(
            m.sink().errors,
            [
                DecodeError::MalformedFrame {
                    kind: TYPE_MONITOR,
                    expected_at_least: 15,
                    found: 0
                },
                DecodeError::MalformedFrame {
                    kind: TYPE_MONITOR,
                    expected_at_least: 15,
                    found: 2
                }
            ]
        );
    }

    #[test]
    fn overflow_is_reported_and_recovered() {
        let mut m = Monitor::with_sink(Recorder::default());
        let mut data = Vec::from([HEADER, TYPE_MONITOR, 0xFF]);
        data.resize(MAX_FRAME_SIZE, 0x00);
        data.extend(wire(&sample()));

        assert_eq!(m.process_all(&data), 1);
        assert_eq!(m.sink().overflows, [MAX_FRAME_SIZE]);
        assert!(m.sink().passthrough.is_empty());
        assert_eq!(m.telemetry(), &sample());
    }

    #[test]
    fn poll_reads_one_byte_at_a_time() {
        let mut m = Monitor::with_sink(());
        let data = wire(&sample());
        let mut rx = ReadBuffer(data.iter().copied().collect());

        let mut decoded = None;
        for _ in 0..data.len() {
            if let Some(t) = m.poll(&mut rx).unwrap() {
                decoded = Some(*t);
            }
        }
        assert_eq!(decoded, Some(sample()));
        assert!(matches!(m.poll(&mut rx), Err(nb::Error::WouldBlock)));
    }

    #[test]
    fn pump_drains_ready_reader() {
        let mut m = Monitor::with_sink(());
        let mut data = wire(&sample());
        data.extend(wire(&Telemetry::default()));
        data.push(0x55);
        let mut reader = ChunkReader {
            data: &data,
            chunk: 5,
        };

        assert_eq!(m.pump(&mut reader), Ok(2));
        assert_eq!(m.telemetry(), &Telemetry::default());
        assert!(reader.data.is_empty());
    }
}
