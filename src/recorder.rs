// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! A generic record-and-replay engine built on the [Scheduler].
//!
//! The recorder captures timestamped events into named patterns and replays
//! them with the recorded inter-event timing, once or looping. The event
//! type is opaque: the same engine can replay MIDI notes, button presses, or
//! anything else the playback callback understands.

use crate::scheduling::{Scheduler, TaskHandle};
use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

/// Receives each recorded event as playback reaches it.
pub type PlaybackFn<E> = Box<dyn FnMut(&E) -> anyhow::Result<()>>;

struct RecorderState<K: Clone + Eq + Hash, E: Clone> {
    recording: Option<K>,
    patterns: FxHashMap<K, Vec<(u64, E)>>,
    // Scheduled playback tasks per pattern, pruned as each one fires, so the
    // set always reflects what is actually in flight.
    play_tasks: FxHashMap<K, FxHashSet<TaskHandle>>,
    // A pattern has an entry here iff it is currently looping.
    loop_tasks: FxHashMap<K, TaskHandle>,
    loop_delays: FxHashMap<K, u64>,
    last_looping: Option<K>,
}
impl<K: Clone + Eq + Hash, E: Clone> Default for RecorderState<K, E> {
    fn default() -> Self {
        Self {
            recording: None,
            patterns: FxHashMap::default(),
            play_tasks: FxHashMap::default(),
            loop_tasks: FxHashMap::default(),
            loop_delays: FxHashMap::default(),
            last_looping: None,
        }
    }
}

struct RecorderShared<K: Clone + Eq + Hash, E: Clone> {
    scheduler: Rc<Scheduler>,
    playback_fn: RefCell<PlaybackFn<E>>,
    state: RefCell<RecorderState<K, E>>,
}

/// Records timestamped event sequences into keyed patterns and replays them.
///
/// Patterns are keyed by an opaque, caller-chosen id. At most one pattern
/// records at a time; any number may play back concurrently, and playing the
/// same pattern twice deliberately overlaps (for rapid retriggering).
///
/// Cheap to clone; clones share the same patterns and playback state.
pub struct Recorder<K, E>
where
    K: Clone + Eq + Hash + Debug + 'static,
    E: Clone + 'static,
{
    shared: Rc<RecorderShared<K, E>>,
}
impl<K, E> Clone for Recorder<K, E>
where
    K: Clone + Eq + Hash + Debug + 'static,
    E: Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}
impl<K, E> Recorder<K, E>
where
    K: Clone + Eq + Hash + Debug + 'static,
    E: Clone + 'static,
{
    #[allow(missing_docs)]
    pub fn new_with(
        scheduler: Rc<Scheduler>,
        playback_fn: impl FnMut(&E) -> anyhow::Result<()> + 'static,
    ) -> Self {
        Self {
            shared: Rc::new(RecorderShared {
                scheduler,
                playback_fn: RefCell::new(Box::new(playback_fn)),
                state: RefCell::new(RecorderState::default()),
            }),
        }
    }

    /// Starts recording into `key`, replacing any pattern already stored
    /// there. Playback of other patterns is unaffected.
    pub fn start_recording(&self, key: K) {
        debug!("recording pattern {key:?}");
        let mut state = self.shared.state.borrow_mut();
        state.patterns.insert(key.clone(), Vec::default());
        state.recording = Some(key);
    }

    /// Stops recording. The captured pattern is kept as-is.
    pub fn stop_recording(&self) {
        let mut state = self.shared.state.borrow_mut();
        if let Some(key) = state.recording.take() {
            debug!("stopped recording pattern {key:?}");
        }
    }

    #[allow(missing_docs)]
    pub fn is_recording(&self) -> bool {
        self.shared.state.borrow().recording.is_some()
    }

    /// The pattern currently being recorded, if any.
    pub fn recording_pattern_id(&self) -> Option<K> {
        self.shared.state.borrow().recording.clone()
    }

    /// Appends an event to the recording pattern. Ignored unless recording.
    ///
    /// Callers are responsible for not feeding back events that are
    /// themselves recording triggers.
    pub fn on_data_event(&self, timestamp_ms: u64, event: E) {
        let mut state = self.shared.state.borrow_mut();
        let Some(key) = state.recording.clone() else {
            return;
        };
        if let Some(pattern) = state.patterns.get_mut(&key) {
            pattern.push((timestamp_ms, event));
        }
    }

    /// Whether a non-empty pattern exists for `key`.
    pub fn has_pattern(&self, key: &K) -> bool {
        self.shared
            .state
            .borrow()
            .patterns
            .get(key)
            .map_or(false, |pattern| !pattern.is_empty())
    }

    /// Remembers the delay inserted between loop cycles of `key`, effective
    /// from the next cycle.
    pub fn set_loop_delay(&self, key: &K, delay_ms: u64) {
        self.shared
            .state
            .borrow_mut()
            .loop_delays
            .insert(key.clone(), delay_ms);
    }

    /// Whether any playback of `key` is still in flight.
    pub fn is_playing(&self, key: &K) -> bool {
        self.shared
            .state
            .borrow()
            .play_tasks
            .get(key)
            .map_or(false, |tasks| !tasks.is_empty())
    }

    /// Whether `key` has a pending loop continuation.
    pub fn is_looping(&self, key: &K) -> bool {
        self.shared.state.borrow().loop_tasks.contains_key(key)
    }

    /// The pattern most recently asked to loop.
    pub fn last_looping_pattern_id(&self) -> Option<K> {
        self.shared.state.borrow().last_looping.clone()
    }

    /// Plays the pattern at `key`, preserving its recorded inter-event
    /// timing. Returns false, changing nothing, if no non-empty pattern
    /// exists there.
    ///
    /// With `looping`, a continuation is scheduled one loop delay after the
    /// last event, and the key is remembered as the last looping pattern. A
    /// pattern already looping is restarted, so a new `loop_delay_ms` takes
    /// effect right away; the in-flight cycle finishes on its own. When
    /// `loop_delay_ms` is `None`, the delay remembered for the pattern (or
    /// zero) applies.
    ///
    /// Errors from the playback callback on immediately-due events surface
    /// here; errors from later events surface from [Scheduler::idle].
    pub fn play(
        &self,
        key: &K,
        looping: bool,
        loop_delay_ms: Option<u64>,
    ) -> anyhow::Result<bool> {
        {
            let mut state = self.shared.state.borrow_mut();
            if !state.patterns.get(key).map_or(false, |p| !p.is_empty()) {
                debug!("nothing to play for pattern {key:?}");
                return Ok(false);
            }
            if looping {
                if let Some(task) = state.loop_tasks.remove(key) {
                    // Restart: drop the pending continuation and reschedule
                    // from the top.
                    self.shared.scheduler.cancel(task);
                }
                state.last_looping = Some(key.clone());
            }
            if let Some(delay_ms) = loop_delay_ms {
                state.loop_delays.insert(key.clone(), delay_ms);
            }
        }
        play_pattern(&self.shared, key.clone(), looping)?;
        Ok(true)
    }

    /// Cancels the pending loop continuation for `key`, letting the
    /// in-flight cycle finish naturally. No-op if not looping.
    pub fn cancel_loop(&self, key: &K) {
        let task = self.shared.state.borrow_mut().loop_tasks.remove(key);
        if let Some(task) = task {
            self.shared.scheduler.cancel(task);
            debug!("canceled loop for pattern {key:?}");
        }
    }

    /// Stops `key` immediately: cancels its loop continuation and every
    /// in-flight playback task. Idempotent; unknown keys are a no-op.
    pub fn stop(&self, key: &K) {
        self.cancel_loop(key);
        let tasks = {
            let mut state = self.shared.state.borrow_mut();
            state
                .play_tasks
                .get_mut(key)
                .map(|tasks| tasks.drain().collect::<Vec<_>>())
        };
        for task in tasks.into_iter().flatten() {
            self.shared.scheduler.cancel(task);
        }
    }

    /// Stops every loop and every in-flight playback for every pattern.
    pub fn stop_all(&self) {
        let (loop_tasks, play_tasks) = {
            let mut state = self.shared.state.borrow_mut();
            let loop_tasks: Vec<TaskHandle> = state.loop_tasks.drain().map(|(_, t)| t).collect();
            let play_tasks: Vec<TaskHandle> = state
                .play_tasks
                .drain()
                .flat_map(|(_, tasks)| tasks.into_iter())
                .collect();
            (loop_tasks, play_tasks)
        };
        for task in loop_tasks.into_iter().chain(play_tasks) {
            self.shared.scheduler.cancel(task);
        }
    }
}

fn play_pattern<K, E>(
    shared: &Rc<RecorderShared<K, E>>,
    key: K,
    looping: bool,
) -> anyhow::Result<()>
where
    K: Clone + Eq + Hash + Debug + 'static,
    E: Clone + 'static,
{
    let events: Vec<(u64, E)> = shared
        .state
        .borrow()
        .patterns
        .get(&key)
        .cloned()
        .unwrap_or_default();
    // The pattern may have been erased or re-recorded empty between cycles.
    if events.is_empty() {
        return Ok(());
    }

    shared
        .state
        .borrow_mut()
        .play_tasks
        .entry(key.clone())
        .or_default();

    let base_ms = events[0].0;
    let mut last_delay_ms = 0;
    for (timestamp_ms, event) in events {
        let delay_ms = timestamp_ms.saturating_sub(base_ms);
        last_delay_ms = delay_ms;
        if delay_ms == 0 {
            (*shared.playback_fn.borrow_mut())(&event)?;
        } else {
            let task = shared.scheduler.schedule(
                {
                    let shared = Rc::clone(shared);
                    move || (*shared.playback_fn.borrow_mut())(&event)
                },
                delay_ms,
            );
            shared
                .state
                .borrow_mut()
                .play_tasks
                .entry(key.clone())
                .or_default()
                .insert(task);
            // A separate cleanup entry at the same delay prunes the handle
            // once the playback task has run; it sorts after the playback
            // task and survives playback errors.
            shared.scheduler.schedule(
                {
                    let shared = Rc::clone(shared);
                    let key = key.clone();
                    move || {
                        if let Some(tasks) = shared.state.borrow_mut().play_tasks.get_mut(&key) {
                            tasks.remove(&task);
                        }
                        Ok(())
                    }
                },
                delay_ms,
            );
        }
    }

    // A pattern that plays out in a single instant must not loop; that would
    // re-enter without ever yielding to the scheduler.
    if looping && last_delay_ms > 0 {
        let loop_delay_ms = shared
            .state
            .borrow()
            .loop_delays
            .get(&key)
            .copied()
            .unwrap_or(0);
        let task = shared.scheduler.schedule(
            {
                let shared = Rc::clone(shared);
                let key = key.clone();
                move || play_pattern(&shared, key, true)
            },
            last_delay_ms + loop_delay_ms,
        );
        let mut state = shared.state.borrow_mut();
        if let Some(previous) = state.loop_tasks.insert(key, task) {
            // Just in case something re-entered while we were scheduling.
            shared.scheduler.cancel(previous);
        }
    }
    Ok(())
}
