// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Time-driven lighting patterns built on the [Scheduler]: blinking a single
//! light, and stepping a sequence of frames across a bank of lights.
//!
//! Each animation owns a running flag and the handle of its latest scheduled
//! step. The step task checks the flag before doing anything, so a stop
//! takes effect even if the cancel raced with an already-queued step.

use crate::lights::ToggleLight;
use crate::scheduling::{Scheduler, TaskHandle};
use rustc_hash::FxHashSet;
use std::cell::RefCell;
use std::rc::Rc;

struct BlinkState {
    interval_ms: u64,
    running: bool,
    task: Option<TaskHandle>,
}

struct BlinkShared<L: ToggleLight + 'static> {
    light: Rc<RefCell<L>>,
    scheduler: Rc<Scheduler>,
    state: RefCell<BlinkState>,
}

/// Toggles a light on a fixed interval until stopped.
///
/// Stopping leaves the light in whatever state it happens to be in;
/// restarting resumes from there.
pub struct BlinkingAnimation<L: ToggleLight + 'static> {
    shared: Rc<BlinkShared<L>>,
}
impl<L: ToggleLight + 'static> BlinkingAnimation<L> {
    #[allow(missing_docs)]
    pub fn new_with(
        light: Rc<RefCell<L>>,
        scheduler: Rc<Scheduler>,
        interval_ms: u64,
    ) -> Self {
        Self {
            shared: Rc::new(BlinkShared {
                light,
                scheduler,
                state: RefCell::new(BlinkState {
                    interval_ms,
                    running: false,
                    task: None,
                }),
            }),
        }
    }

    /// Starts blinking, with the first toggle one interval from now. No-op
    /// if already running.
    pub fn start(&self) {
        let interval_ms = {
            let mut state = self.shared.state.borrow_mut();
            if state.running {
                return;
            }
            state.running = true;
            state.interval_ms
        };
        schedule_blink(&self.shared, interval_ms);
    }

    /// Stops blinking, leaving the light as-is. No-op if already stopped.
    pub fn stop(&self) {
        let task = {
            let mut state = self.shared.state.borrow_mut();
            if !state.running {
                return;
            }
            state.running = false;
            state.task.take()
        };
        if let Some(task) = task {
            self.shared.scheduler.cancel(task);
        }
    }

    /// Manually toggles the light once, independent of the schedule.
    pub fn step(&self) -> anyhow::Result<bool> {
        self.shared.light.borrow_mut().toggle()
    }

    #[allow(missing_docs)]
    pub fn is_running(&self) -> bool {
        self.shared.state.borrow().running
    }

    /// Changes how fast the light blinks, effective from the next toggle.
    pub fn set_interval_ms(&self, interval_ms: u64) {
        self.shared.state.borrow_mut().interval_ms = interval_ms;
    }
}

fn schedule_blink<L: ToggleLight + 'static>(shared: &Rc<BlinkShared<L>>, delay_ms: u64) {
    let task = {
        shared.scheduler.schedule(
            {
                let shared = Rc::clone(shared);
                move || {
                    if !shared.state.borrow().running {
                        return Ok(());
                    }
                    shared.light.borrow_mut().toggle()?;
                    let interval_ms = shared.state.borrow().interval_ms;
                    schedule_blink(&shared, interval_ms);
                    Ok(())
                }
            },
            delay_ms,
        )
    };
    shared.state.borrow_mut().task = Some(task);
}

struct SequentialState {
    index: usize,
    interval_ms: u64,
    running: bool,
    task: Option<TaskHandle>,
    last_frame: FxHashSet<usize>,
}

struct SequentialShared<L: ToggleLight + 'static> {
    scheduler: Rc<Scheduler>,
    lights: Vec<Rc<RefCell<L>>>,
    frames: Vec<Vec<usize>>,
    all_lights: Vec<usize>,
    looping: bool,
    state: RefCell<SequentialState>,
}

/// Steps a bank of lights through a sequence of frames, where each frame is
/// the set of lights (by index) that should be the only ones on.
///
/// Stepping turns off the lights that fell out of the previous frame. At the
/// wrap back to frame zero, every light the animation touches that isn't in
/// frame zero is turned off, which repairs any toggles something else made
/// between steps.
pub struct SequentialAnimation<L: ToggleLight + 'static> {
    shared: Rc<SequentialShared<L>>,
}
impl<L: ToggleLight + 'static> SequentialAnimation<L> {
    /// Creates an animation over `lights` playing `frames`, each frame a
    /// list of indices into `lights`.
    ///
    /// Panics on an empty frame list or an out-of-range index; both are
    /// configuration mistakes.
    pub fn new_with(
        lights: Vec<Rc<RefCell<L>>>,
        frames: Vec<Vec<usize>>,
        scheduler: Rc<Scheduler>,
        interval_ms: u64,
        looping: bool,
    ) -> Self {
        assert!(!frames.is_empty(), "an animation needs at least one frame");
        let mut all_lights = FxHashSet::default();
        for frame in &frames {
            for &index in frame {
                assert!(index < lights.len(), "frame refers to a missing light");
                all_lights.insert(index);
            }
        }
        let mut all_lights: Vec<usize> = all_lights.into_iter().collect();
        all_lights.sort_unstable();
        Self {
            shared: Rc::new(SequentialShared {
                scheduler,
                lights,
                frames,
                all_lights,
                looping,
                state: RefCell::new(SequentialState {
                    index: 0,
                    interval_ms,
                    running: false,
                    task: None,
                    last_frame: FxHashSet::default(),
                }),
            }),
        }
    }

    /// Starts the animation. The first frame renders on the next idle tick,
    /// or one interval out when `initial_delay` is set. No-op if running.
    pub fn start(&self, initial_delay: bool) {
        let delay_ms = {
            let mut state = self.shared.state.borrow_mut();
            if state.running {
                return;
            }
            state.running = true;
            if initial_delay {
                state.interval_ms
            } else {
                0
            }
        };
        schedule_sequence(&self.shared, delay_ms);
    }

    /// Stops the animation where it is. No-op if already stopped.
    pub fn stop(&self) {
        let task = {
            let mut state = self.shared.state.borrow_mut();
            if !state.running {
                return;
            }
            state.running = false;
            state.task.take()
        };
        if let Some(task) = task {
            self.shared.scheduler.cancel(task);
        }
    }

    /// Renders the next frame immediately, independent of the schedule.
    pub fn step(&self) -> anyhow::Result<()> {
        animate_step(&self.shared)
    }

    /// Rewinds to the first frame without touching any lights.
    pub fn reset(&self) {
        self.shared.state.borrow_mut().index = 0;
    }

    #[allow(missing_docs)]
    pub fn is_running(&self) -> bool {
        self.shared.state.borrow().running
    }

    #[allow(missing_docs)]
    pub fn set_interval_ms(&self, interval_ms: u64) {
        self.shared.state.borrow_mut().interval_ms = interval_ms;
    }
}

fn animate_step<L: ToggleLight + 'static>(
    shared: &SequentialShared<L>,
) -> anyhow::Result<()> {
    let (turn_off, current_frame) = {
        let state = shared.state.borrow();
        let current_frame: FxHashSet<usize> =
            shared.frames[state.index].iter().copied().collect();
        let turn_off: Vec<usize> = if state.index == 0 {
            // At the wrap, reset every light we own that isn't in frame 0.
            shared
                .all_lights
                .iter()
                .filter(|index| !current_frame.contains(*index))
                .copied()
                .collect()
        } else {
            state
                .last_frame
                .iter()
                .filter(|index| !current_frame.contains(*index))
                .copied()
                .collect()
        };
        (turn_off, current_frame)
    };

    for &index in &turn_off {
        shared.lights[index].borrow_mut().set_on(false, false)?;
    }
    for &index in &current_frame {
        shared.lights[index].borrow_mut().set_on(true, false)?;
    }

    let mut state = shared.state.borrow_mut();
    state.last_frame = current_frame;
    state.index = (state.index + 1) % shared.frames.len();
    Ok(())
}

fn schedule_sequence<L: ToggleLight + 'static>(
    shared: &Rc<SequentialShared<L>>,
    delay_ms: u64,
) {
    let task = {
        shared.scheduler.schedule(
            {
                let shared = Rc::clone(shared);
                move || {
                    if !shared.state.borrow().running {
                        return Ok(());
                    }
                    animate_step(&shared)?;
                    let (stop_now, interval_ms) = {
                        let state = shared.state.borrow();
                        (!shared.looping && state.index == 0, state.interval_ms)
                    };
                    if stop_now {
                        let mut state = shared.state.borrow_mut();
                        state.running = false;
                        state.task = None;
                        return Ok(());
                    }
                    schedule_sequence(&shared, interval_ms);
                    Ok(())
                }
            },
            delay_ms,
        )
    };
    shared.state.borrow_mut().task = Some(task);
}

/// Makes a list of lights into a metronome: each beat advances to the next
/// light, wrapping at the end. A single-light metronome alternates that
/// light with an all-off frame so the beat stays visible.
pub struct Metronome<L: ToggleLight + 'static> {
    animation: SequentialAnimation<L>,
}
impl<L: ToggleLight + 'static> Metronome<L> {
    #[allow(missing_docs)]
    pub fn new_with(scheduler: Rc<Scheduler>, lights: Vec<Rc<RefCell<L>>>) -> Self {
        let mut frames: Vec<Vec<usize>> = (0..lights.len()).map(|index| vec![index]).collect();
        if frames.len() == 1 {
            frames.push(Vec::default());
        }
        Self {
            animation: SequentialAnimation::new_with(lights, frames, scheduler, 1000, true),
        }
    }

    /// Advances the metronome one beat.
    pub fn beat(&self) -> anyhow::Result<()> {
        self.animation.step()
    }

    /// Restarts the metronome from the first beat.
    pub fn reset(&self) {
        self.animation.reset();
    }
}
