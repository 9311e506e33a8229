// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! The pad looper: panels that wire drum-pad gestures to the
//! [Recorder](crate::recorder::Recorder) so that each pad records, replays,
//! and loops its own pattern.
//!
//! Patterns are keyed by the (status, data1) pair of the pad that triggered
//! them, so every pad owns a distinct slot.

use crate::daw::{ChannelRack, Mixer, Tempo};
use crate::matchers::Matcher;
use crate::midi::{self, Midi, MidiMessage};
use crate::panel::Panel;
use crate::recorder::Recorder;
use crate::refresh::RefreshFlags;
use std::cell::RefCell;
use std::rc::Rc;

/// A pad's pattern slot: the (status, data1) pair of the triggering event.
pub type PatternId = (u8, u8);

/// The recorder type the looper panels share.
pub type PadRecorder = Recorder<PatternId, RecordedEvent>;

/// One captured event plus the recording-time context playback needs: the
/// channel-rack selection in effect when the event was recorded.
#[derive(Clone, Debug)]
pub struct RecordedEvent {
    #[allow(missing_docs)]
    pub message: MidiMessage,
    /// The channel the event should replay into.
    pub channel_index: usize,
}

/// The pattern slot an event addresses.
pub fn pattern_id(message: &MidiMessage) -> PatternId {
    (message.status, message.data1)
}

/// A playback function that replays captured notes into the channel rack.
/// Note-offs go out as velocity-zero note-ons, which the rack treats as
/// equivalent.
pub fn channel_rack_playback(
    rack: Rc<RefCell<dyn ChannelRack>>,
) -> impl FnMut(&RecordedEvent) -> anyhow::Result<()> {
    move |event| {
        let message = &event.message;
        match message.masked_status() {
            Midi::STATUS_NOTE_ON => rack.borrow_mut().play_midi_note(
                event.channel_index,
                message.data1,
                message.data2,
            ),
            Midi::STATUS_NOTE_OFF => {
                rack.borrow_mut()
                    .play_midi_note(event.channel_index, message.data1, 0)
            }
            _ => Ok(()),
        }
    }
}

/// The tempo-derived loop-delay choices for an encoder: sixteen delays of
/// one to sixteen quarter-beats.
pub fn loop_delay_steps(tempo: Tempo) -> Vec<u64> {
    let interval_ms = tempo.quarter_beat_ms();
    (1..=16)
        .map(|step| (step as f64 * interval_ms).round() as u64)
        .collect()
}

/// Arms recording for the pattern slot of whatever triggered the start
/// matcher. While something is already recording, start triggers are
/// ignored.
pub struct RecordPattern {
    attached: bool,
    start_matcher: Matcher,
    recorder: PadRecorder,
    output_fn: Box<dyn FnMut(PatternId) -> anyhow::Result<()>>,
}
impl RecordPattern {
    #[allow(missing_docs)]
    pub fn new_with(
        start_matcher: Matcher,
        recorder: PadRecorder,
        output_fn: impl FnMut(PatternId) -> anyhow::Result<()> + 'static,
    ) -> Self {
        Self {
            attached: true,
            start_matcher,
            recorder,
            output_fn: Box::new(output_fn),
        }
    }
}
impl Panel for RecordPattern {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    fn handle_message(&mut self, message: &mut MidiMessage) -> anyhow::Result<()> {
        if self.recorder.is_recording() {
            return Ok(());
        }
        if (self.start_matcher)(message) {
            let id = pattern_id(message);
            self.recorder.start_recording(id);
            (self.output_fn)(id)?;
            message.mark_handled();
        }
        Ok(())
    }

    fn render(&mut self, _flags: RefreshFlags) -> anyhow::Result<()> {
        // Keep the recording indicator honest across full refreshes.
        if let Some(id) = self.recorder.recording_pattern_id() {
            (self.output_fn)(id)?;
        }
        Ok(())
    }
}

/// Disarms recording when the stop matcher fires.
pub struct StopRecordPattern {
    attached: bool,
    stop_matcher: Matcher,
    recorder: PadRecorder,
    output_fn: Box<dyn FnMut(PatternId) -> anyhow::Result<()>>,
}
impl StopRecordPattern {
    #[allow(missing_docs)]
    pub fn new_with(
        stop_matcher: Matcher,
        recorder: PadRecorder,
        output_fn: impl FnMut(PatternId) -> anyhow::Result<()> + 'static,
    ) -> Self {
        Self {
            attached: true,
            stop_matcher,
            recorder,
            output_fn: Box::new(output_fn),
        }
    }
}
impl Panel for StopRecordPattern {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    fn handle_message(&mut self, message: &mut MidiMessage) -> anyhow::Result<()> {
        if !self.recorder.is_recording() {
            return Ok(());
        }
        if (self.stop_matcher)(message) {
            if let Some(id) = self.recorder.recording_pattern_id() {
                self.recorder.stop_recording();
                (self.output_fn)(id)?;
            }
        }
        Ok(())
    }

    fn render(&mut self, _flags: RefreshFlags) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Plays the triggering pad's pattern once. Pressing the pad of a looping
/// pattern cancels its loop instead, letting the cycle run out.
pub struct PlayPattern {
    attached: bool,
    play_matcher: Matcher,
    recorder: PadRecorder,
    output_fn: Box<dyn FnMut(PatternId, bool) -> anyhow::Result<()>>,
}
impl PlayPattern {
    #[allow(missing_docs)]
    pub fn new_with(
        play_matcher: Matcher,
        recorder: PadRecorder,
        output_fn: impl FnMut(PatternId, bool) -> anyhow::Result<()> + 'static,
    ) -> Self {
        Self {
            attached: true,
            play_matcher,
            recorder,
            output_fn: Box::new(output_fn),
        }
    }
}
impl Panel for PlayPattern {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    fn handle_message(&mut self, message: &mut MidiMessage) -> anyhow::Result<()> {
        if (self.play_matcher)(message) {
            let id = pattern_id(message);
            if self.recorder.is_looping(&id) {
                self.recorder.cancel_loop(&id);
                (self.output_fn)(id, false)?;
                message.mark_handled();
            } else if self.recorder.play(&id, false, None)? {
                (self.output_fn)(id, true)?;
                message.mark_handled();
            }
        }
        Ok(())
    }

    fn render(&mut self, _flags: RefreshFlags) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Loops the triggering pad's pattern. Pressing the pad of a pattern that
/// is already looping cancels the loop.
pub struct PlayLoop {
    attached: bool,
    play_matcher: Matcher,
    recorder: PadRecorder,
    output_fn: Box<dyn FnMut(PatternId, bool) -> anyhow::Result<()>>,
}
impl PlayLoop {
    #[allow(missing_docs)]
    pub fn new_with(
        play_matcher: Matcher,
        recorder: PadRecorder,
        output_fn: impl FnMut(PatternId, bool) -> anyhow::Result<()> + 'static,
    ) -> Self {
        Self {
            attached: true,
            play_matcher,
            recorder,
            output_fn: Box::new(output_fn),
        }
    }
}
impl Panel for PlayLoop {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    fn handle_message(&mut self, message: &mut MidiMessage) -> anyhow::Result<()> {
        if (self.play_matcher)(message) {
            let id = pattern_id(message);
            if self.recorder.is_looping(&id) {
                self.recorder.cancel_loop(&id);
                (self.output_fn)(id, false)?;
                message.mark_handled();
            } else if self.recorder.play(&id, true, None)? {
                (self.output_fn)(id, true)?;
                message.mark_handled();
            }
        }
        Ok(())
    }

    fn render(&mut self, _flags: RefreshFlags) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Stops the triggering pad's pattern immediately, loop and all.
pub struct StopNow {
    attached: bool,
    stop_matcher: Matcher,
    recorder: PadRecorder,
    output_fn: Box<dyn FnMut(PatternId) -> anyhow::Result<()>>,
}
impl StopNow {
    #[allow(missing_docs)]
    pub fn new_with(
        stop_matcher: Matcher,
        recorder: PadRecorder,
        output_fn: impl FnMut(PatternId) -> anyhow::Result<()> + 'static,
    ) -> Self {
        Self {
            attached: true,
            stop_matcher,
            recorder,
            output_fn: Box::new(output_fn),
        }
    }
}
impl Panel for StopNow {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    fn handle_message(&mut self, message: &mut MidiMessage) -> anyhow::Result<()> {
        if (self.stop_matcher)(message) {
            let id = pattern_id(message);
            self.recorder.stop(&id);
            (self.output_fn)(id)?;
            message.mark_handled();
        }
        Ok(())
    }

    fn render(&mut self, _flags: RefreshFlags) -> anyhow::Result<()> {
        Ok(())
    }
}

/// The panic button: stops any recording in progress and silences every
/// pattern. Harmless when nothing is recording or playing.
pub struct StopAll {
    attached: bool,
    stop_matcher: Matcher,
    recorder: PadRecorder,
    output_fn: Box<dyn FnMut() -> anyhow::Result<()>>,
}
impl StopAll {
    #[allow(missing_docs)]
    pub fn new_with(
        stop_matcher: Matcher,
        recorder: PadRecorder,
        output_fn: impl FnMut() -> anyhow::Result<()> + 'static,
    ) -> Self {
        Self {
            attached: true,
            stop_matcher,
            recorder,
            output_fn: Box::new(output_fn),
        }
    }
}
impl Panel for StopAll {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    fn handle_message(&mut self, message: &mut MidiMessage) -> anyhow::Result<()> {
        if (self.stop_matcher)(message) {
            self.recorder.stop_recording();
            self.recorder.stop_all();
            (self.output_fn)()?;
            message.mark_handled();
        }
        Ok(())
    }

    fn render(&mut self, _flags: RefreshFlags) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Adjusts the loop delay of the last-looped pattern from an encoder: the
/// normalized position picks one of sixteen quarter-beat multiples at the
/// mixer's current tempo.
pub struct SetLoopDelay {
    attached: bool,
    encoder_matcher: Matcher,
    recorder: PadRecorder,
    mixer: Rc<RefCell<dyn Mixer>>,
    output_fn: Box<dyn FnMut(f64, u64) -> anyhow::Result<()>>,
}
impl SetLoopDelay {
    #[allow(missing_docs)]
    pub fn new_with(
        encoder_matcher: Matcher,
        recorder: PadRecorder,
        mixer: Rc<RefCell<dyn Mixer>>,
        output_fn: impl FnMut(f64, u64) -> anyhow::Result<()> + 'static,
    ) -> Self {
        Self {
            attached: true,
            encoder_matcher,
            recorder,
            mixer,
            output_fn: Box::new(output_fn),
        }
    }
}
impl Panel for SetLoopDelay {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    fn handle_message(&mut self, message: &mut MidiMessage) -> anyhow::Result<()> {
        if (self.encoder_matcher)(message) {
            let Some(id) = self.recorder.last_looping_pattern_id() else {
                return Ok(());
            };
            let value = midi::encoded_value(message);
            let steps = loop_delay_steps(self.mixer.borrow().current_tempo());
            let index = ((steps.len() - 1) as f64 * value).round() as usize;
            let delay_ms = steps[index];
            self.recorder.set_loop_delay(&id, delay_ms);
            (self.output_fn)(value, delay_ms)?;
            message.mark_handled();
        }
        Ok(())
    }

    fn render(&mut self, _flags: RefreshFlags) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Feeds recordable events into the recorder, stamping each with the
/// channel-rack selection in effect at capture time.
///
/// The filter decides what is worth recording (typically note on/off from
/// the keys); control gestures like the pads that start and stop recording
/// must not pass it, or they'd re-trigger themselves on replay.
pub struct EventsForRecording {
    attached: bool,
    filter_matcher: Matcher,
    recorder: PadRecorder,
    rack: Rc<RefCell<dyn ChannelRack>>,
    output_fn: Box<dyn FnMut(&MidiMessage) -> anyhow::Result<()>>,
}
impl EventsForRecording {
    #[allow(missing_docs)]
    pub fn new_with(
        filter_matcher: Matcher,
        recorder: PadRecorder,
        rack: Rc<RefCell<dyn ChannelRack>>,
        output_fn: impl FnMut(&MidiMessage) -> anyhow::Result<()> + 'static,
    ) -> Self {
        Self {
            attached: true,
            filter_matcher,
            recorder,
            rack,
            output_fn: Box::new(output_fn),
        }
    }
}
impl Panel for EventsForRecording {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    fn handle_message(&mut self, message: &mut MidiMessage) -> anyhow::Result<()> {
        if !self.recorder.is_recording() {
            return Ok(());
        }
        if (self.filter_matcher)(message) {
            let event = RecordedEvent {
                message: message.clone(),
                channel_index: self.rack.borrow().selected_channel(),
            };
            self.recorder.on_data_event(message.timestamp_ms, event);
            (self.output_fn)(message)?;
        }
        Ok(())
    }

    fn render(&mut self, _flags: RefreshFlags) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FakeClock};
    use crate::matchers::{require_all, MidiHas};
    use crate::scheduling::Scheduler;

    #[derive(Default)]
    struct StubRack {
        selected: usize,
        notes: Vec<(usize, u8, u8)>,
    }
    impl ChannelRack for StubRack {
        fn channel_count(&self) -> usize {
            16
        }

        fn selected_channel(&self) -> usize {
            self.selected
        }

        fn select_channel(&mut self, index: usize) {
            self.selected = index;
        }

        fn channel_name(&self, index: usize) -> String {
            format!("Channel {index}")
        }

        fn play_midi_note(&mut self, channel: usize, note: u8, velocity: u8) -> anyhow::Result<()> {
            self.notes.push((channel, note, velocity));
            Ok(())
        }
    }

    struct StubMixer {
        milli_bpm: u32,
    }
    impl Mixer for StubMixer {
        fn set_track_volume(&mut self, _: usize, _: f64) -> anyhow::Result<()> {
            Ok(())
        }

        fn current_tempo_milli_bpm(&self) -> u32 {
            self.milli_bpm
        }
    }

    struct Fixture {
        clock: Rc<FakeClock>,
        scheduler: Rc<Scheduler>,
        rack: Rc<RefCell<StubRack>>,
        recorder: PadRecorder,
    }
    impl Fixture {
        fn new() -> Self {
            let clock = Rc::new(FakeClock::default());
            let scheduler = Rc::new(Scheduler::new_with(Rc::clone(&clock) as Rc<dyn Clock>));
            let rack = Rc::new(RefCell::new(StubRack::default()));
            let recorder = Recorder::new_with(
                Rc::clone(&scheduler),
                channel_rack_playback(Rc::clone(&rack) as Rc<RefCell<dyn ChannelRack>>),
            );
            Self {
                clock,
                scheduler,
                rack,
                recorder,
            }
        }
    }

    fn pad_on(data1: u8, timestamp_ms: u64) -> MidiMessage {
        MidiMessage::new_with(0x99, data1, 0x7F, timestamp_ms)
    }

    #[test]
    fn record_then_replay_through_the_rack() {
        let fixture = Fixture::new();
        let is_pad_down = || MidiHas::new().status(0x99).data2(0x7F).matcher();
        // Note on/off from the keys, any channel.
        let keys = || MidiHas::new().status_range(0x80, 0x9F).matcher();

        let mut record =
            RecordPattern::new_with(is_pad_down(), fixture.recorder.clone(), |_| Ok(()));
        let mut capture = EventsForRecording::new_with(
            keys(),
            fixture.recorder.clone(),
            Rc::clone(&fixture.rack) as Rc<RefCell<dyn ChannelRack>>,
            |_| Ok(()),
        );

        fixture.rack.borrow_mut().selected = 5;

        // Pad 0x24 arms its slot...
        let mut arm = pad_on(0x24, 0);
        assert!(record.process(&mut arm).is_ok());
        assert!(arm.handled);
        assert!(fixture.recorder.is_recording());

        // ...then two key events are captured with the active channel.
        let mut first = MidiMessage::new_with(0x90, 0x30, 0x60, 100);
        let mut second = MidiMessage::new_with(0x80, 0x30, 0x00, 600);
        assert!(capture.process(&mut first).is_ok());
        assert!(capture.process(&mut second).is_ok());
        fixture.recorder.stop_recording();

        // Replay: the note-on goes out as recorded, the note-off as
        // velocity zero, both into channel 5.
        assert!(fixture
            .recorder
            .play(&(0x99, 0x24), false, None)
            .unwrap());
        assert_eq!(*fixture.rack.borrow().notes.first().unwrap(), (5, 0x30, 0x60));

        fixture.clock.set(500);
        assert!(fixture.scheduler.idle().is_ok());
        assert_eq!(fixture.rack.borrow().notes, vec![(5, 0x30, 0x60), (5, 0x30, 0)]);
    }

    #[test]
    fn second_record_trigger_is_ignored_while_recording() {
        let fixture = Fixture::new();
        let mut record = RecordPattern::new_with(
            MidiHas::new().status(0x99).data2(0x7F).matcher(),
            fixture.recorder.clone(),
            |_| Ok(()),
        );

        assert!(record.process(&mut pad_on(0x24, 0)).is_ok());
        let mut second = pad_on(0x25, 10);
        assert!(record.process(&mut second).is_ok());
        assert!(!second.handled);
        assert_eq!(fixture.recorder.recording_pattern_id(), Some((0x99, 0x24)));
    }

    #[test]
    fn stop_record_panel_disarms() {
        let fixture = Fixture::new();
        let stopped = Rc::new(RefCell::new(Vec::default()));
        let mut stop = {
            let stopped = Rc::clone(&stopped);
            StopRecordPattern::new_with(
                MidiHas::new().status(0xB0).data1(0x75).matcher(),
                fixture.recorder.clone(),
                move |id| {
                    stopped.borrow_mut().push(id);
                    Ok(())
                },
            )
        };

        // Nothing recording: the stop trigger is ignored.
        assert!(stop
            .process(&mut MidiMessage::new_with(0xB0, 0x75, 0x7F, 0))
            .is_ok());
        assert!(stopped.borrow().is_empty());

        fixture.recorder.start_recording((0x99, 0x24));
        assert!(stop
            .process(&mut MidiMessage::new_with(0xB0, 0x75, 0x7F, 1))
            .is_ok());
        assert!(!fixture.recorder.is_recording());
        assert_eq!(*stopped.borrow(), vec![(0x99, 0x24)]);
    }

    #[test]
    fn play_pad_cancels_its_own_loop_on_second_press() {
        let fixture = Fixture::new();
        fixture.recorder.start_recording((0x99, 0x24));
        fixture
            .recorder
            .on_data_event(0, RecordedEvent {
                message: MidiMessage::new_with(0x90, 0x30, 0x40, 0),
                channel_index: 0,
            });
        fixture
            .recorder
            .on_data_event(1000, RecordedEvent {
                message: MidiMessage::new_with(0x80, 0x30, 0x00, 1000),
                channel_index: 0,
            });
        fixture.recorder.stop_recording();

        let states = Rc::new(RefCell::new(Vec::default()));
        let mut looper = {
            let states = Rc::clone(&states);
            PlayLoop::new_with(
                MidiHas::new().status(0x99).data2(0x7F).matcher(),
                fixture.recorder.clone(),
                move |id, looping| {
                    states.borrow_mut().push((id, looping));
                    Ok(())
                },
            )
        };

        let mut press = pad_on(0x24, 0);
        assert!(looper.process(&mut press).is_ok());
        assert!(press.handled);
        assert!(fixture.recorder.is_looping(&(0x99, 0x24)));

        let mut again = pad_on(0x24, 10);
        assert!(looper.process(&mut again).is_ok());
        assert!(!fixture.recorder.is_looping(&(0x99, 0x24)));
        assert_eq!(
            *states.borrow(),
            vec![((0x99, 0x24), true), ((0x99, 0x24), false)]
        );
    }

    #[test]
    fn play_pad_with_no_pattern_stays_unhandled() {
        let fixture = Fixture::new();
        let mut play = PlayPattern::new_with(
            MidiHas::new().status(0x99).data2(0x7F).matcher(),
            fixture.recorder.clone(),
            |_, _| Ok(()),
        );
        let mut press = pad_on(0x24, 0);
        assert!(play.process(&mut press).is_ok());
        assert!(!press.handled);
    }

    #[test]
    fn stop_all_panel_stops_recording_and_playback() {
        let fixture = Fixture::new();
        fixture.recorder.start_recording((0x99, 0x24));

        let mut stop_all = StopAll::new_with(
            require_all(vec![MidiHas::new().status(0xB0).data1(0x69).matcher()]),
            fixture.recorder.clone(),
            || Ok(()),
        );
        let mut press = MidiMessage::new_with(0xB0, 0x69, 0x7F, 0);
        assert!(stop_all.process(&mut press).is_ok());
        assert!(press.handled);
        assert!(!fixture.recorder.is_recording());

        // With nothing recording or playing, it stays a harmless no-op.
        let mut again = MidiMessage::new_with(0xB0, 0x69, 0x7F, 1);
        assert!(stop_all.process(&mut again).is_ok());
    }

    #[test]
    fn loop_delay_encoder_picks_a_quarter_beat_multiple() {
        let fixture = Fixture::new();
        let mixer = Rc::new(RefCell::new(StubMixer { milli_bpm: 120_000 }));

        fixture.recorder.start_recording((0x99, 0x24));
        fixture.recorder.on_data_event(0, RecordedEvent {
            message: MidiMessage::new_with(0x90, 0x30, 0x40, 0),
            channel_index: 0,
        });
        fixture.recorder.on_data_event(500, RecordedEvent {
            message: MidiMessage::new_with(0x80, 0x30, 0x00, 500),
            channel_index: 0,
        });
        fixture.recorder.stop_recording();
        assert!(fixture.recorder.play(&(0x99, 0x24), true, None).unwrap());

        let outputs = Rc::new(RefCell::new(Vec::default()));
        let mut panel = {
            let outputs = Rc::clone(&outputs);
            SetLoopDelay::new_with(
                MidiHas::new().status(0xB0).data1(0x15).matcher(),
                fixture.recorder.clone(),
                Rc::clone(&mixer) as Rc<RefCell<dyn Mixer>>,
                move |value, delay_ms| {
                    outputs.borrow_mut().push((value, delay_ms));
                    Ok(())
                },
            )
        };

        // At 120 BPM a quarter beat is 125ms; full twist picks 16 of them.
        let mut twist = MidiMessage::new_with(0xB0, 0x15, 0x7F, 0);
        assert!(panel.process(&mut twist).is_ok());
        assert!(twist.handled);
        assert_eq!(*outputs.borrow(), vec![(1.0, 2000)]);

        // Zero picks the single quarter beat.
        let mut zero = MidiMessage::new_with(0xB0, 0x15, 0x00, 1);
        assert!(panel.process(&mut zero).is_ok());
        assert_eq!(outputs.borrow().last(), Some(&(0.0, 125)));

        fixture.recorder.stop_all();
    }

    #[test]
    fn loop_delay_encoder_needs_a_looping_pattern() {
        let fixture = Fixture::new();
        let mixer = Rc::new(RefCell::new(StubMixer { milli_bpm: 120_000 }));
        let mut panel = SetLoopDelay::new_with(
            MidiHas::new().status(0xB0).data1(0x15).matcher(),
            fixture.recorder.clone(),
            Rc::clone(&mixer) as Rc<RefCell<dyn Mixer>>,
            |_, _| Ok(()),
        );

        let mut twist = MidiMessage::new_with(0xB0, 0x15, 0x40, 0);
        assert!(panel.process(&mut twist).is_ok());
        assert!(!twist.handled);
    }

    #[test]
    fn loop_delay_steps_scale_with_tempo() {
        let steps = loop_delay_steps(Tempo(120.0));
        assert_eq!(steps.len(), 16);
        assert_eq!(steps[0], 125);
        assert_eq!(steps[15], 2000);

        let slower = loop_delay_steps(Tempo(60.0));
        assert_eq!(slower[0], 250);
    }
}
