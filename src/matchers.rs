// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Pure predicates over [MidiMessage]s, and combinators for composing them.
//!
//! A matcher classifies a message without side effects. Bindings and panels
//! pair matchers with handlers; the vocabulary here is the closed set the
//! dispatch pipeline understands.

use crate::midi::{Midi, MidiMessage};

/// A pure predicate over a [MidiMessage].
pub type Matcher = Box<dyn Fn(&MidiMessage) -> bool>;

/// Matches messages with the given raw status byte.
pub fn status_eq(status: u8) -> Matcher {
    Box::new(move |m| m.status == status)
}

/// Matches messages whose channel-masked status equals the given value.
pub fn masked_status_eq(masked_status: u8) -> Matcher {
    Box::new(move |m| m.masked_status() == masked_status)
}

/// Matches messages with the given data1 byte.
pub fn data1_eq(data1: u8) -> Matcher {
    Box::new(move |m| m.data1 == data1)
}

/// Matches messages with the given data2 byte.
pub fn data2_eq(data2: u8) -> Matcher {
    Box::new(move |m| m.data2 == data2)
}

/// Matches messages on the given channel.
pub fn channel_eq(channel: u8) -> Matcher {
    Box::new(move |m| m.channel() == channel)
}

/// Matches note-on messages.
pub fn note_on() -> Matcher {
    masked_status_eq(Midi::STATUS_NOTE_ON)
}

/// Matches note-off messages.
pub fn note_off() -> Matcher {
    masked_status_eq(Midi::STATUS_NOTE_OFF)
}

/// Matches status bytes in the inclusive range.
pub fn status_in_range(min_value: u8, max_value: u8) -> Matcher {
    Box::new(move |m| (min_value..=max_value).contains(&m.status))
}

/// Matches data1 bytes in the inclusive range.
pub fn data1_in_range(min_value: u8, max_value: u8) -> Matcher {
    Box::new(move |m| (min_value..=max_value).contains(&m.data1))
}

/// Matches data2 bytes in the inclusive range.
pub fn data2_in_range(min_value: u8, max_value: u8) -> Matcher {
    Box::new(move |m| (min_value..=max_value).contains(&m.data2))
}

/// Matches status bytes in the given set.
pub fn status_in(values: &[u8]) -> Matcher {
    let values = values.to_vec();
    Box::new(move |m| values.contains(&m.status))
}

/// Matches data1 bytes in the given set.
pub fn data1_in(values: &[u8]) -> Matcher {
    let values = values.to_vec();
    Box::new(move |m| values.contains(&m.data1))
}

/// Matches data2 bytes in the given set.
pub fn data2_in(values: &[u8]) -> Matcher {
    let values = values.to_vec();
    Box::new(move |m| values.contains(&m.data2))
}

/// Matches toggle controls transmitting their ON extreme (data2 = 0x7F).
pub fn is_on() -> Matcher {
    data2_eq(0x7F)
}

/// Matches toggle controls transmitting their OFF extreme (data2 = 0x00).
pub fn is_off() -> Matcher {
    data2_eq(0x00)
}

/// Matches when every given matcher matches. Stops at the first miss.
pub fn require_all(matchers: Vec<Matcher>) -> Matcher {
    Box::new(move |m| matchers.iter().all(|matcher| matcher(m)))
}

/// Matches when any given matcher matches. Stops at the first hit.
pub fn require_any(matchers: Vec<Matcher>) -> Matcher {
    Box::new(move |m| matchers.iter().any(|matcher| matcher(m)))
}

/// Complements a matcher.
pub fn is_not(matcher: Matcher) -> Matcher {
    Box::new(move |m| !matcher(m))
}

/// Builds a matcher from any combination of per-byte constraints, ANDing the
/// ones that are specified and ignoring the rest.
///
/// ```
/// use entrain::matchers::MidiHas;
/// use entrain::midi::MidiMessage;
///
/// let matcher = MidiHas::new().status(0x90).data1(0x30).matcher();
/// assert!(matcher(&MidiMessage::new_with(0x90, 0x30, 0x42, 0)));
/// assert!(!matcher(&MidiMessage::new_with(0x90, 0x31, 0x42, 0)));
/// ```
#[derive(Debug, Default)]
pub struct MidiHas {
    status: Option<u8>,
    data1: Option<u8>,
    data2: Option<u8>,
    status_range: Option<(u8, u8)>,
    data1_range: Option<(u8, u8)>,
    data2_range: Option<(u8, u8)>,
    status_in: Option<Vec<u8>>,
    data1_in: Option<Vec<u8>>,
    data2_in: Option<Vec<u8>>,
}
#[allow(missing_docs)]
impl MidiHas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: u8) -> Self {
        self.status = Some(status);
        self
    }

    pub fn data1(mut self, data1: u8) -> Self {
        self.data1 = Some(data1);
        self
    }

    pub fn data2(mut self, data2: u8) -> Self {
        self.data2 = Some(data2);
        self
    }

    pub fn status_range(mut self, min_value: u8, max_value: u8) -> Self {
        self.status_range = Some((min_value, max_value));
        self
    }

    pub fn data1_range(mut self, min_value: u8, max_value: u8) -> Self {
        self.data1_range = Some((min_value, max_value));
        self
    }

    pub fn data2_range(mut self, min_value: u8, max_value: u8) -> Self {
        self.data2_range = Some((min_value, max_value));
        self
    }

    pub fn status_in(mut self, values: &[u8]) -> Self {
        self.status_in = Some(values.to_vec());
        self
    }

    pub fn data1_in(mut self, values: &[u8]) -> Self {
        self.data1_in = Some(values.to_vec());
        self
    }

    pub fn data2_in(mut self, values: &[u8]) -> Self {
        self.data2_in = Some(values.to_vec());
        self
    }

    /// Consumes the builder, producing the combined matcher.
    pub fn matcher(self) -> Matcher {
        Box::new(move |m| {
            self.status.map_or(true, |v| m.status == v)
                && self.data1.map_or(true, |v| m.data1 == v)
                && self.data2.map_or(true, |v| m.data2 == v)
                && self
                    .status_range
                    .map_or(true, |(lo, hi)| (lo..=hi).contains(&m.status))
                && self
                    .data1_range
                    .map_or(true, |(lo, hi)| (lo..=hi).contains(&m.data1))
                && self
                    .data2_range
                    .map_or(true, |(lo, hi)| (lo..=hi).contains(&m.data2))
                && self
                    .status_in
                    .as_ref()
                    .map_or(true, |values| values.contains(&m.status))
                && self
                    .data1_in
                    .as_ref()
                    .map_or(true, |values| values.contains(&m.data1))
                && self
                    .data2_in
                    .as_ref()
                    .map_or(true, |values| values.contains(&m.data2))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn message(status: u8, data1: u8, data2: u8) -> MidiMessage {
        MidiMessage::new_with(status, data1, data2, 0)
    }

    // A matcher that records whether it was consulted, for short-circuit
    // checks.
    fn counting(result: bool, calls: &Rc<Cell<usize>>) -> Matcher {
        let calls = Rc::clone(calls);
        Box::new(move |_| {
            calls.set(calls.get() + 1);
            result
        })
    }

    #[test]
    fn byte_equality() {
        assert!(status_eq(0x90)(&message(0x90, 0, 0)));
        assert!(!status_eq(0x90)(&message(0x91, 0, 0)));
        assert!(data1_eq(0x30)(&message(0x90, 0x30, 0)));
        assert!(data2_eq(0x7F)(&message(0x90, 0, 0x7F)));
        assert!(masked_status_eq(0x90)(&message(0x9F, 0, 0)));
        assert!(channel_eq(9)(&message(0x99, 0, 0)));
    }

    #[test]
    fn note_on_and_off_follow_the_midi_standard() {
        assert!(note_on()(&message(0x90, 0x30, 0x40)));
        assert!(note_on()(&message(0x95, 0x30, 0x40)));
        assert!(!note_on()(&message(0x80, 0x30, 0x40)));
        assert!(note_off()(&message(0x80, 0x30, 0x00)));
        assert!(!note_off()(&message(0x90, 0x30, 0x00)));
    }

    #[test]
    fn ranges_are_inclusive() {
        let matcher = data1_in_range(0x24, 0x33);
        assert!(matcher(&message(0x99, 0x24, 0)));
        assert!(matcher(&message(0x99, 0x33, 0)));
        assert!(!matcher(&message(0x99, 0x34, 0)));
        assert!(status_in_range(0x80, 0x8F)(&message(0x85, 0, 0)));
        assert!(data2_in_range(0x10, 0x20)(&message(0x80, 0, 0x18)));
    }

    #[test]
    fn sets_match_membership() {
        let matcher = data1_in(&[0x24, 0x30]);
        assert!(matcher(&message(0x99, 0x24, 0)));
        assert!(!matcher(&message(0x99, 0x25, 0)));
        assert!(status_in(&[0x90, 0xB0])(&message(0xB0, 0, 0)));
        assert!(data2_in(&[0x00, 0x7F])(&message(0x90, 0, 0x7F)));
    }

    #[test]
    fn toggle_extremes() {
        assert!(is_on()(&message(0xB0, 0x75, 0x7F)));
        assert!(is_off()(&message(0xB0, 0x75, 0x00)));
        assert!(!is_on()(&message(0xB0, 0x75, 0x00)));
    }

    #[test]
    fn require_all_short_circuits_on_first_false() {
        let calls = Rc::new(Cell::new(0));
        let matcher = require_all(vec![
            counting(false, &calls),
            counting(true, &calls),
        ]);
        assert!(!matcher(&message(0, 0, 0)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn require_any_short_circuits_on_first_true() {
        let calls = Rc::new(Cell::new(0));
        let matcher = require_any(vec![
            counting(true, &calls),
            counting(false, &calls),
        ]);
        assert!(matcher(&message(0, 0, 0)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn negation() {
        let matcher = is_not(status_eq(0x90));
        assert!(!matcher(&message(0x90, 0, 0)));
        assert!(matcher(&message(0x80, 0, 0)));
    }

    #[test]
    fn midi_has_ands_only_the_specified_constraints() {
        let matcher = MidiHas::new().status(0x90).data1(0x30).matcher();
        assert!(matcher(&message(0x90, 0x30, 0x00)));
        assert!(matcher(&message(0x90, 0x30, 0x55)));
        assert!(!matcher(&message(0x90, 0x31, 0x55)));
        assert!(!matcher(&message(0x80, 0x30, 0x55)));
        assert!(!matcher(&message(0xB0, 0x30, 0x55)));
    }

    #[test]
    fn midi_has_mixes_constraint_shapes() {
        let matcher = MidiHas::new()
            .status_range(0x90, 0x9F)
            .data1_in(&[0x24, 0x25])
            .data2(0x7F)
            .matcher();
        assert!(matcher(&message(0x99, 0x24, 0x7F)));
        assert!(!matcher(&message(0x99, 0x26, 0x7F)));
        assert!(!matcher(&message(0x99, 0x24, 0x00)));
        assert!(!matcher(&message(0xB0, 0x24, 0x7F)));
    }

    #[test]
    fn midi_has_with_no_constraints_matches_everything() {
        let matcher = MidiHas::new().matcher();
        assert!(matcher(&message(0x00, 0x00, 0x00)));
        assert!(matcher(&message(0xFF, 0x7F, 0x7F)));
    }
}
