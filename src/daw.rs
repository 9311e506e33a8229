// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! The interfaces the runtime requires from its DAW host.
//!
//! The core never talks to a DAW directly; an embedding script supplies
//! adapters implementing these traits. The test suites implement them with
//! in-memory stubs.

use derive_more::From;
use std::fmt;

/// Beats per minute.
#[derive(Clone, Copy, Debug, From, PartialEq)]
pub struct Tempo(pub f64);
impl Default for Tempo {
    fn default() -> Self {
        Self(128.0)
    }
}
impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:0.2} BPM", self.0))
    }
}
impl Tempo {
    /// Converts from the milli-BPM (BPM x 1000) representation DAW hosts
    /// report.
    pub fn from_milli_bpm(milli_bpm: u32) -> Self {
        Self(milli_bpm as f64 / 1000.0)
    }

    #[allow(missing_docs)]
    pub fn bpm(&self) -> f64 {
        self.0
    }

    /// The duration of one beat in milliseconds.
    pub fn beat_ms(&self) -> f64 {
        60_000.0 / self.0
    }

    /// The duration of a quarter of a beat in milliseconds.
    pub fn quarter_beat_ms(&self) -> f64 {
        15_000.0 / self.0
    }
}

/// The channel rack: where the DAW keeps its instruments.
pub trait ChannelRack {
    /// How many channels exist.
    fn channel_count(&self) -> usize;

    /// The index of the first selected channel.
    fn selected_channel(&self) -> usize;

    /// Selects exactly the given channel, deselecting every other.
    fn select_channel(&mut self, index: usize);

    /// The display name of the channel at `index`.
    fn channel_name(&self, index: usize) -> String;

    /// Emits a note-on into the channel's instrument. Velocity zero serves
    /// as note-off.
    fn play_midi_note(&mut self, channel: usize, note: u8, velocity: u8) -> anyhow::Result<()>;
}

/// The mixer: levels and tempo.
pub trait Mixer {
    /// Sets a mixer track's volume, normalized to [0, 1].
    fn set_track_volume(&mut self, track: usize, volume: f64) -> anyhow::Result<()>;

    /// The current tempo in milli-BPM (BPM x 1000).
    fn current_tempo_milli_bpm(&self) -> u32;

    /// The current tempo.
    fn current_tempo(&self) -> Tempo {
        Tempo::from_milli_bpm(self.current_tempo_milli_bpm())
    }
}

/// The transport: play, stop, record.
#[allow(missing_docs)]
pub trait Transport {
    fn stop(&mut self);
    fn toggle_play(&mut self);
    fn toggle_record(&mut self);
}

/// The connection back to the controller hardware and to sibling scripts.
pub trait Device {
    /// Sends a raw SYSEX buffer to the controller.
    fn send_sysex(&mut self, command: &[u8]) -> anyhow::Result<()>;

    /// The MIDI port this script is bound to.
    fn port_number(&self) -> u8;

    /// Forwards a 3-byte message to every sibling script, packed per
    /// [packed_dispatch_message].
    fn dispatch_to_siblings(&mut self, status: u8, data1: u8, data2: u8);
}

/// Packs a 3-byte MIDI message the way script-to-script dispatch expects:
/// `status | data1 << 8 | data2 << 16`.
pub fn packed_dispatch_message(status: u8, data1: u8, data2: u8) -> u32 {
    status as u32 | (data1 as u32) << 8 | (data2 as u32) << 16
}
