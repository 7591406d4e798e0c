//! Byte layout of the STWBC2 serial protocol.
//!
//! Frame: `[header][type][length][payload...]`, `length` counts payload bytes
//! only. Monitor field ranges are relative to the payload, i.e. frame offset
//! minus [`FRAME_HEADER_LENGTH`].

use core::ops::Range;

/// Sentinel that starts every frame.
pub const HEADER: u8 = 0x54;
/// Discriminator of the monitor message.
pub const TYPE_MONITOR: u8 = 0xB3;
/// Capacity of the accumulator, header bytes included.
pub const MAX_FRAME_SIZE: usize = 256;
/// Header, type and length bytes.
pub const FRAME_HEADER_LENGTH: usize = 3;
pub const MAX_PAYLOAD_SIZE: usize = MAX_FRAME_SIZE - FRAME_HEADER_LENGTH;

pub const TYPE_OFFSET: usize = 1;
pub const LENGTH_OFFSET: usize = 2;

pub const STATE_OFFSET: usize = 0;
/// Little endian, first byte is the LSB.
pub const FREQUENCY_RANGE: Range<usize> = 1..5;
pub const CONTROL_ERROR_OFFSET: usize = 5;
pub const DUTY_CYCLE_OFFSET: usize = 6;
pub const BRIDGE_VOLTAGE_RANGE: Range<usize> = 7..9;
pub const RX_POWER_RANGE: Range<usize> = 9..11;
/// On the wire but not part of the snapshot.
pub const RESERVED_RANGE: Range<usize> = 11..13;
pub const INPUT_VOLTAGE_RANGE: Range<usize> = 13..15;
/// Smallest payload that carries every monitor field.
pub const MONITOR_PAYLOAD_LENGTH: usize = 15;

/// Duty cycle byte is a percentage.
pub const DUTY_CYCLE_SCALE: f64 = 100.0;
/// Voltages and power are transmitted in thousandths.
pub const MILLI_SCALE: f64 = 1000.0;
