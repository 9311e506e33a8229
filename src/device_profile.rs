// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Per-controller SYSEX command assembly.
//!
//! When several LEDs change in one refresh, the updates are batched into a
//! single byte buffer for [Device::send_sysex](crate::daw::Device). The
//! profile here covers the Novation Launchkey Mini Mk3.
//!
//! Reference:
//! <https://www.kraftmusic.com/media/ownersmanual/Novation_Launchkey_Programmers_Reference_Manual.pdf>

use crate::matchers::{
    channel_eq, data1_eq, data1_in_range, masked_status_eq, require_all, Matcher,
};
use strum_macros::{Display, EnumIter, FromRepr};

/// Which pad bank the device addresses its pad LEDs through.
///
/// Novation maintains separate light state per layout, so an unused layout
/// can serve as an off-screen buffer. The runtime sticks with the drum
/// layout, which is what the keyboard powers on in.
#[derive(Clone, Copy, Debug, Default, Display, EnumIter, FromRepr, PartialEq, Eq)]
pub enum PadLayout {
    #[default]
    Drum,
    Session,
}

/// Command structure for the Novation Launchkey Mini Mk3.
pub struct LaunchkeyMk3;
#[allow(missing_docs)]
impl LaunchkeyMk3 {
    // Exits DAW mode, which defaults the pads to the drum layout.
    const CMD_PREAMBLE: [u8; 3] = [0x9F, 0x0C, 0x00];

    pub const SOLID_LED_STATUS_CMD: u8 = 0x99;
    pub const BLINK_LED_STATUS_CMD: u8 = 0x9B;

    /// The pad note ids, top row then bottom row, in the drum layout.
    pub const DRUM_PAD_IDS: [[u8; 8]; 2] = [
        [0x28, 0x29, 0x2A, 0x2B, 0x30, 0x31, 0x32, 0x33],
        [0x24, 0x25, 0x26, 0x27, 0x2C, 0x2D, 0x2E, 0x2F],
    ];

    /// The pad note ids in the session layout.
    pub const SESSION_PAD_IDS: [[u8; 8]; 2] = [
        [0x60, 0x61, 0x62, 0x63, 0x64, 0x65, 0x66, 0x67],
        [0x70, 0x71, 0x72, 0x73, 0x74, 0x75, 0x76, 0x77],
    ];

    /// Drum pads transmit on this channel (channel 10 on the wire).
    pub const DRUM_PAD_MIDI_CHANNEL: u8 = 9;

    pub fn pad_ids(layout: PadLayout) -> [[u8; 8]; 2] {
        match layout {
            PadLayout::Drum => Self::DRUM_PAD_IDS,
            PadLayout::Session => Self::SESSION_PAD_IDS,
        }
    }

    /// The channel-rack index a drum pad maps to: the top row is 0..8, the
    /// bottom row 8..16. None for ids that aren't pads.
    pub fn pad_channel_index(pad_id: u8) -> Option<usize> {
        Self::DRUM_PAD_IDS
            .iter()
            .flatten()
            .position(|&candidate| candidate == pad_id)
    }

    pub fn is_record_button() -> Matcher {
        require_all(vec![masked_status_eq(0xB0), data1_eq(0x75)])
    }

    pub fn is_play_button() -> Matcher {
        require_all(vec![masked_status_eq(0xB0), data1_eq(0x73)])
    }

    pub fn is_page_up_button() -> Matcher {
        require_all(vec![masked_status_eq(0xB0), data1_eq(0x68)])
    }

    pub fn is_page_down_button() -> Matcher {
        require_all(vec![masked_status_eq(0xB0), data1_eq(0x69)])
    }

    pub fn is_drum_pad() -> Matcher {
        require_all(vec![
            channel_eq(Self::DRUM_PAD_MIDI_CHANNEL),
            data1_in_range(0x24, 0x33),
        ])
    }

    pub fn new_command() -> LaunchkeyMk3Command {
        LaunchkeyMk3Command::default()
    }
}

/// Accumulates LED and display updates, then assembles the device-specific
/// byte buffer. Light ids and values travel as pairs, so a color update
/// can't arrive half-specified.
#[derive(Debug, Default)]
pub struct LaunchkeyMk3Command {
    lights_to_set_colors: Vec<(u8, u8)>,
    lights_to_turn_on: Vec<u8>,
    lights_to_turn_off: Vec<u8>,
    lights_to_blink: Vec<(u8, u8)>,
    display_updates: Vec<(u8, Vec<String>)>,
}
impl LaunchkeyMk3Command {
    /// Queues (light id, color value) updates.
    pub fn light_color(mut self, pairs: &[(u8, u8)]) -> Self {
        self.lights_to_set_colors.extend_from_slice(pairs);
        self
    }

    /// Queues lights to turn fully on.
    pub fn light_on(mut self, light_ids: &[u8]) -> Self {
        self.lights_to_turn_on.extend_from_slice(light_ids);
        self
    }

    /// Queues lights to turn off.
    pub fn light_off(mut self, light_ids: &[u8]) -> Self {
        self.lights_to_turn_off.extend_from_slice(light_ids);
        self
    }

    /// Queues (light id, color value) blink updates.
    pub fn blinking_light(mut self, pairs: &[(u8, u8)]) -> Self {
        self.lights_to_blink.extend_from_slice(pairs);
        self
    }

    /// Queues lines for the given display. The Launchkey Mini has no
    /// display, so these are dropped at build time.
    pub fn display(mut self, display_id: u8, lines: Vec<String>) -> Self {
        self.display_updates.push((display_id, lines));
        self
    }

    /// Assembles the byte buffer to hand to the device. Empty if nothing
    /// was queued.
    pub fn build(self) -> Vec<u8> {
        let mut command = Vec::default();
        if !self.lights_to_turn_off.is_empty()
            || !self.lights_to_turn_on.is_empty()
            || !self.lights_to_set_colors.is_empty()
            || !self.lights_to_blink.is_empty()
        {
            command.extend_from_slice(&LaunchkeyMk3::CMD_PREAMBLE);
            for light_id in &self.lights_to_turn_off {
                command.extend_from_slice(&[LaunchkeyMk3::SOLID_LED_STATUS_CMD, *light_id, 0x00]);
            }
            for light_id in &self.lights_to_turn_on {
                command.extend_from_slice(&[LaunchkeyMk3::SOLID_LED_STATUS_CMD, *light_id, 0x77]);
            }
            for (light_id, value) in &self.lights_to_set_colors {
                command.extend_from_slice(&[LaunchkeyMk3::SOLID_LED_STATUS_CMD, *light_id, *value]);
            }
            for (light_id, value) in &self.lights_to_blink {
                command.extend_from_slice(&[LaunchkeyMk3::BLINK_LED_STATUS_CMD, *light_id, *value]);
            }
        }
        // No display on the Launchkey Mini Mk3.
        command
    }
}
