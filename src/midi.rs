// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! The raw-byte MIDI message that flows through the dispatch pipeline, plus
//! the constants and value-decoding rules that interpret it.
//!
//! For a good overview of how MIDI messages are structured, refer to
//! <http://users.cs.cf.ac.uk/Dave.Marshall/Multimedia/node158.html>.

use std::fmt;

/// MIDI wire constants.
pub struct Midi;
#[allow(missing_docs)]
impl Midi {
    pub const CHANNEL_MASK: u8 = 0x0F;

    // Channel messages
    pub const STATUS_NOTE_ON: u8 = 0x90; // data1 = key number, data2 = velocity
    pub const STATUS_NOTE_OFF: u8 = 0x80; // data1 = key number, data2 = velocity
    pub const STATUS_POLYPHONIC_KEY_PRESSURE: u8 = 0xA0; // data1 = key number, data2 = pressure
    pub const STATUS_CONTROL_CHANGE: u8 = 0xB0; // data1 = controller number
    pub const STATUS_PROGRAM_CHANGE: u8 = 0xC0; // data1 = program number
    pub const STATUS_CHANNEL_PRESSURE: u8 = 0xD0; // data1 = pressure value
    pub const STATUS_PITCH_BEND: u8 = 0xE0; // data1 = MSB, data2 = LSB

    pub const DATA1_CHANNEL_MODE_RESET_ALL: u8 = 0x79;
    pub const DATA1_CHANNEL_MODE_LOCAL_CONTROL: u8 = 0x7A; // data2 - 0=off, 127=on
    pub const DATA1_CHANNEL_MODE_ALL_NOTES_OFF: u8 = 0x7B;
    pub const DATA1_CHANNEL_MODE_OMNI_MODE_OFF: u8 = 0x7C;
    pub const DATA1_CHANNEL_MODE_OMNI_MODE_ON: u8 = 0x7D;
    pub const DATA1_CHANNEL_MODE_MONO_MODE: u8 = 0x7E;
    pub const DATA1_CHANNEL_MODE_POLY_MODE: u8 = 0x7F;

    pub const DATA2_MAX: u8 = 0x7F;
}

/// One inbound MIDI event as the host delivered it.
///
/// The three bytes and the timestamp are fixed at construction; only the
/// `handled` flag mutates during dispatch. Handlers that consume a message
/// set `handled` so that the host-edge shim can tell the host to suppress
/// its default processing. The framework itself never short-circuits on the
/// flag; handlers that want to skip handled messages test it themselves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MidiMessage {
    #[allow(missing_docs)]
    pub status: u8,
    #[allow(missing_docs)]
    pub data1: u8,
    #[allow(missing_docs)]
    pub data2: u8,
    /// When the host delivered this event, per the runtime's [Clock](crate::clock::Clock).
    pub timestamp_ms: u64,
    /// Whether some handler has consumed this event.
    pub handled: bool,
}
impl MidiMessage {
    #[allow(missing_docs)]
    pub fn new_with(status: u8, data1: u8, data2: u8, timestamp_ms: u64) -> Self {
        Self {
            status,
            data1,
            data2,
            timestamp_ms,
            handled: false,
        }
    }

    /// The status byte with the channel bits masked out.
    pub fn masked_status(&self) -> u8 {
        self.status & !Midi::CHANNEL_MASK
    }

    /// The channel this message belongs to (0..=15).
    pub fn channel(&self) -> u8 {
        self.status & Midi::CHANNEL_MASK
    }

    /// Consumes the event so the host's default processing is suppressed.
    pub fn mark_handled(&mut self) {
        self.handled = true;
    }

    /// The message as it appeared on the wire.
    pub fn to_bytes(&self) -> [u8; 3] {
        [self.status, self.data1, self.data2]
    }
}
impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[MIDI Status=0x{:02X}, Data1=0x{:02X}, Data2=0x{:02X}]",
            self.status, self.data1, self.data2
        )
    }
}

/// Decodes an absolute controller position from data2, normalized to
/// [0.0, 1.0].
pub fn encoded_value(message: &MidiMessage) -> f64 {
    message.data2 as f64 / Midi::DATA2_MAX as f64
}

/// Decodes an absolute controller position from data2, remapped to the given
/// inclusive range.
pub fn encoded_value_in_range(message: &MidiMessage, range: (f64, f64)) -> f64 {
    let (low, high) = range;
    low + encoded_value(message) * (high - low)
}

/// Decodes a differential (infinite/relative encoder) value from data2: the
/// top bit is the sign, the low six bits are the magnitude. The result is a
/// signed delta in [-0.5, 0.5); accumulation is the caller's business.
pub fn relative_encoded_value(message: &MidiMessage) -> f64 {
    let magnitude = (message.data2 & 0x3F) as f64 / Midi::DATA2_MAX as f64;
    if message.data2 & 0x40 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn masked_status_and_channel() {
        let m = MidiMessage::new_with(0x9A, 0x30, 0x7F, 0);
        assert_eq!(m.masked_status(), Midi::STATUS_NOTE_ON);
        assert_eq!(m.channel(), 0x0A);
        assert_eq!(m.to_bytes(), [0x9A, 0x30, 0x7F]);
    }

    #[test]
    fn handled_flag_starts_clear() {
        let mut m = MidiMessage::new_with(0x80, 0, 0, 0);
        assert!(!m.handled);
        m.mark_handled();
        assert!(m.handled);
    }

    #[test]
    fn displays_as_hex() {
        let m = MidiMessage::new_with(0x90, 0x0C, 0x7F, 0);
        assert_eq!(
            m.to_string(),
            "[MIDI Status=0x90, Data1=0x0C, Data2=0x7F]"
        );
    }

    #[test]
    fn absolute_value_decoding() {
        let low = MidiMessage::new_with(0xB0, 0x15, 0x00, 0);
        let high = MidiMessage::new_with(0xB0, 0x15, 0x7F, 0);
        assert_eq!(encoded_value(&low), 0.0);
        assert_eq!(encoded_value(&high), 1.0);

        assert_eq!(encoded_value_in_range(&low, (50.0, 100.0)), 50.0);
        assert_eq!(encoded_value_in_range(&high, (50.0, 100.0)), 100.0);
    }

    #[test]
    fn differential_value_decoding() {
        let clockwise = MidiMessage::new_with(0xB0, 0x15, 0x02, 0);
        let counterclockwise = MidiMessage::new_with(0xB0, 0x15, 0x42, 0);
        assert!(approx_eq!(
            f64,
            relative_encoded_value(&clockwise),
            2.0 / 127.0
        ));
        assert!(approx_eq!(
            f64,
            relative_encoded_value(&counterclockwise),
            -2.0 / 127.0
        ));
    }
}
