//! Monitor message decoding.
//!
//! The monitor message is the only message kind that is decoded. It reports the
//! transmitter's state machine, operating point and measured power in a fixed
//! 15 byte payload:
//!
//! ```text
//! offset  size  field
//! 0       1     state
//! 1       4     frequency, little endian
//! 5       1     control error
//! 6       1     duty cycle, percent
//! 7       2     bridge voltage, little endian, 1/1000
//! 9       2     rx power, little endian, 1/1000
//! 11      2     reserved
//! 13      2     input voltage, little endian, 1/1000
//! ```

use core::ops::Range;

use bilge::prelude::*;

use crate::{
    Decode, Encode,
    frame::{Frame, FrameError, MessageType},
    layout::{
        BRIDGE_VOLTAGE_RANGE, CONTROL_ERROR_OFFSET, DUTY_CYCLE_OFFSET, DUTY_CYCLE_SCALE,
        FREQUENCY_RANGE, INPUT_VOLTAGE_RANGE, MILLI_SCALE, MONITOR_PAYLOAD_LENGTH, RESERVED_RANGE,
        RX_POWER_RANGE, STATE_OFFSET,
    },
};

/// Transmitter state machine, as reported in the state byte.
#[bitsize(8)]
#[derive(FromBits, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargerState {
    NoState = 0x00,
    SelectionAp = 0x01,
    SelectionQf = 0x02,
    FsmPrePing = 0x03,
    FsmPing = 0x04,
    ConfigCheckId = 0x05,
    ConfigCheckExtId = 0x06,
    ConfigCheckConf = 0x07,
    Negotiation = 0x08,
    Renegotiation = 0x09,
    Calibration = 0x0A,
    PowerTransfer = 0x0B,
    PowerPid = 0x0C,
    #[fallback]
    Unknown,
}

/// Latest decoded monitor values.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Telemetry {
    /// Raw state byte, see [`Telemetry::charger_state`].
    pub state: u8,
    /// Operating frequency in Hz.
    pub frequency: u32,
    pub control_error: u16,
    /// Fraction, 0.5 for 50%.
    pub duty_cycle: f64,
    /// Volts.
    pub bridge_voltage: f64,
    /// Watts.
    pub rx_power: f64,
    /// Volts.
    pub input_voltage: f64,
}

impl Telemetry {
    pub fn charger_state(&self) -> ChargerState {
        ChargerState::from(self.state)
    }

    /// Monitor frame carrying these values, as the transmitter would send it.
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        let mut payload = [0u8; MONITOR_PAYLOAD_LENGTH];
        let size = self.encode(&mut payload)?;
        Frame::new(MessageType::Monitor, &payload[0..size])
    }
}

impl<'a> From<&MonitorMessage<'a>> for Telemetry {
    fn from(m: &MonitorMessage<'a>) -> Self {
        Telemetry {
            state: m.state(),
            frequency: m.frequency(),
            control_error: m.control_error(),
            duty_cycle: m.duty_cycle(),
            bridge_voltage: m.bridge_voltage(),
            rx_power: m.rx_power(),
            input_voltage: m.input_voltage(),
        }
    }
}

/// Scale a physical value back to its wire integer. Non-negative values round
/// to nearest. Anything below zero maps to 0 and values above the range to the
/// maximum, since `as` saturates.
fn unscale_u16(value: f64, scale: f64) -> u16 {
    (value * scale + 0.5) as u16
}

fn unscale_u8(value: f64, scale: f64) -> u8 {
    (value * scale + 0.5) as u8
}

impl Encode for Telemetry {
    type Error = FrameError;

    /// Writes a monitor payload. Reserved bytes are zero and the control error
    /// saturates at one byte.
    fn encode(&self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        if buffer.len() < MONITOR_PAYLOAD_LENGTH {
            return Err(FrameError::EncodeBufferTooSmall {
                expected: MONITOR_PAYLOAD_LENGTH,
                found: buffer.len(),
            });
        }
        let out = &mut buffer[0..MONITOR_PAYLOAD_LENGTH];
        out[STATE_OFFSET] = self.state;
        out[FREQUENCY_RANGE].copy_from_slice(&self.frequency.to_le_bytes());
        out[CONTROL_ERROR_OFFSET] = self.control_error.min(u8::MAX as u16) as u8;
        out[DUTY_CYCLE_OFFSET] = unscale_u8(self.duty_cycle, DUTY_CYCLE_SCALE);
        out[BRIDGE_VOLTAGE_RANGE]
            .copy_from_slice(&unscale_u16(self.bridge_voltage, MILLI_SCALE).to_le_bytes());
        out[RX_POWER_RANGE].copy_from_slice(&unscale_u16(self.rx_power, MILLI_SCALE).to_le_bytes());
        out[RESERVED_RANGE].copy_from_slice(&[0, 0]);
        out[INPUT_VOLTAGE_RANGE]
            .copy_from_slice(&unscale_u16(self.input_voltage, MILLI_SCALE).to_le_bytes());
        Ok(MONITOR_PAYLOAD_LENGTH)
    }
}

/// Named field access over a monitor payload that has been checked to hold
/// every field.
#[derive(Debug, Clone, Copy)]
pub struct MonitorMessage<'a> {
    payload: &'a [u8],
}

impl<'a> MonitorMessage<'a> {
    fn le_u16(&self, range: Range<usize>) -> u16 {
        let b = &self.payload[range];
        u16::from_le_bytes([b[0], b[1]])
    }

    pub fn state(&self) -> u8 {
        self.payload[STATE_OFFSET]
    }

    pub fn frequency(&self) -> u32 {
        let b = &self.payload[FREQUENCY_RANGE];
        u32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }

    pub fn control_error(&self) -> u16 {
        self.payload[CONTROL_ERROR_OFFSET] as u16
    }

    pub fn duty_cycle(&self) -> f64 {
        self.payload[DUTY_CYCLE_OFFSET] as f64 / DUTY_CYCLE_SCALE
    }

    pub fn bridge_voltage(&self) -> f64 {
        self.le_u16(BRIDGE_VOLTAGE_RANGE) as f64 / MILLI_SCALE
    }

    pub fn rx_power(&self) -> f64 {
        self.le_u16(RX_POWER_RANGE) as f64 / MILLI_SCALE
    }

    pub fn input_voltage(&self) -> f64 {
        self.le_u16(INPUT_VOLTAGE_RANGE) as f64 / MILLI_SCALE
    }

    /// Undecoded bytes between rx power and input voltage.
    pub fn reserved(&self) -> [u8; 2] {
        let b = &self.payload[RESERVED_RANGE];
        [b[0], b[1]]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A recognized message whose payload is shorter than its fields.
    MalformedFrame {
        kind: u8,
        expected_at_least: usize,
        found: usize,
    },
}

impl<'a> Decode<'a> for MonitorMessage<'a> {
    type Error = DecodeError;

    /// `data` is the payload of a monitor frame. Extra bytes are ignored.
    fn decode(data: &'a [u8]) -> Result<Self, Self::Error> {
        if data.len() < MONITOR_PAYLOAD_LENGTH {
            return Err(DecodeError::MalformedFrame {
                kind: MessageType::Monitor.into(),
                expected_at_least: MONITOR_PAYLOAD_LENGTH,
                found: data.len(),
            });
        }
        Ok(MonitorMessage { payload: data })
    }
}

/// Decode a complete frame.
///
/// Returns `Ok(None)` for message kinds that are not decoded. Those are
/// expected on the wire and are not an error.
pub fn decode(frame: &Frame) -> Result<Option<Telemetry>, DecodeError> {
    match frame.message_type() {
        MessageType::Monitor => {
            let m = MonitorMessage::decode(frame.payload())?;
            Ok(Some(Telemetry::from(&m)))
        }
        MessageType::Unrecognized(_) => Ok(None),
    }
}
