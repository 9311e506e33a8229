// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Press classification for physical buttons.
//!
//! A controller button produces one MIDI event when pushed down and another
//! when released. The types here turn that pair of events into either a
//! short press or a long press, using the [Scheduler] to detect when a
//! button has been held past the threshold.

use crate::scheduling::{Scheduler, TaskHandle};
use crate::states::Cycles;
use std::cell::RefCell;
use std::rc::Rc;

/// A callback fired when a press is classified.
pub type PressListener = Box<dyn FnMut() -> anyhow::Result<()>>;

struct SimpleButtonState {
    long_press_delay_ms: u64,
    on_press: Option<PressListener>,
    on_long_press: Option<PressListener>,
    long_press_task: Option<TaskHandle>,
}

struct SimpleButtonShared {
    scheduler: Rc<Scheduler>,
    state: RefCell<SimpleButtonState>,
}

/// Classifies button-down/button-up event pairs as short or long presses.
///
/// On button-down, a long-press task is scheduled at the threshold. If the
/// button comes up while that task can still be canceled, the hold was
/// short and the press listener fires; otherwise the long-press listener
/// has already fired and the release is ignored.
pub struct SimpleButton {
    shared: Rc<SimpleButtonShared>,
}
impl SimpleButton {
    /// How long a button must stay down to register as a long press.
    pub const DEFAULT_LONG_PRESS_DELAY_MS: u64 = 450;

    #[allow(missing_docs)]
    pub fn new_with(scheduler: Rc<Scheduler>, long_press_delay_ms: u64) -> Self {
        Self {
            shared: Rc::new(SimpleButtonShared {
                scheduler,
                state: RefCell::new(SimpleButtonState {
                    long_press_delay_ms,
                    on_press: None,
                    on_long_press: None,
                    long_press_task: None,
                }),
            }),
        }
    }

    #[allow(missing_docs)]
    pub fn new(scheduler: Rc<Scheduler>) -> Self {
        Self::new_with(scheduler, Self::DEFAULT_LONG_PRESS_DELAY_MS)
    }

    /// Sets the listener for short presses.
    pub fn set_press_listener(&self, listener: impl FnMut() -> anyhow::Result<()> + 'static) {
        self.shared.state.borrow_mut().on_press = Some(Box::new(listener));
    }

    /// Sets the listener for long presses.
    pub fn set_long_press_listener(
        &self,
        listener: impl FnMut() -> anyhow::Result<()> + 'static,
    ) {
        self.shared.state.borrow_mut().on_long_press = Some(Box::new(listener));
    }

    /// Manually fires the short-press listener.
    pub fn press(&self) -> anyhow::Result<()> {
        fire(&self.shared, false)
    }

    /// Manually fires the long-press listener.
    pub fn long_press(&self) -> anyhow::Result<()> {
        fire(&self.shared, true)
    }

    /// Call when the button's down event arrives.
    pub fn on_button_down(&self) {
        let delay_ms = self.shared.state.borrow().long_press_delay_ms;
        let task = {
            let shared = Rc::clone(&self.shared);
            self.shared
                .scheduler
                .schedule(move || fire(&shared, true), delay_ms)
        };
        self.shared.state.borrow_mut().long_press_task = Some(task);
    }

    /// Call when the button's up event arrives. Fires the short-press
    /// listener iff the long-press task had not yet run.
    pub fn on_button_up(&self) -> anyhow::Result<()> {
        let task = self.shared.state.borrow_mut().long_press_task.take();
        if let Some(task) = task {
            if self.shared.scheduler.cancel(task) {
                return self.press();
            }
        }
        Ok(())
    }
}

// Runs the requested listener with the state borrow released, so a listener
// is free to reconfigure the button.
fn fire(shared: &SimpleButtonShared, long: bool) -> anyhow::Result<()> {
    let listener = {
        let mut state = shared.state.borrow_mut();
        if long {
            state.on_long_press.take()
        } else {
            state.on_press.take()
        }
    };
    let Some(mut listener) = listener else {
        return Ok(());
    };
    let result = listener();
    let mut state = shared.state.borrow_mut();
    let slot = if long {
        &mut state.on_long_press
    } else {
        &mut state.on_press
    };
    if slot.is_none() {
        *slot = Some(listener);
    }
    result
}

struct ToggleListeners {
    on_press: Option<PressListener>,
    on_long_press: Option<PressListener>,
}

/// A button that cycles a state on each short press and, optionally, a
/// second state on each long press. The direction of cycling is
/// configurable. After the state advances, the corresponding listener (if
/// any) runs.
pub struct ToggleStateButton {
    button: SimpleButton,
    listeners: Rc<RefCell<ToggleListeners>>,
}
impl ToggleStateButton {
    #[allow(missing_docs)]
    pub fn new_with(
        state: Rc<RefCell<dyn Cycles>>,
        scheduler: Rc<Scheduler>,
        long_press_state: Option<Rc<RefCell<dyn Cycles>>>,
        reverse_direction: bool,
    ) -> Self {
        let button = SimpleButton::new(scheduler);
        let listeners = Rc::new(RefCell::new(ToggleListeners {
            on_press: None,
            on_long_press: None,
        }));

        button.set_press_listener({
            let state = Rc::clone(&state);
            let listeners = Rc::clone(&listeners);
            move || {
                state.borrow_mut().advance(reverse_direction)?;
                if let Some(listener) = listeners.borrow_mut().on_press.as_mut() {
                    listener()?;
                }
                Ok(())
            }
        });
        button.set_long_press_listener({
            let listeners = Rc::clone(&listeners);
            move || {
                if let Some(long_press_state) = long_press_state.as_ref() {
                    long_press_state.borrow_mut().advance(reverse_direction)?;
                }
                if let Some(listener) = listeners.borrow_mut().on_long_press.as_mut() {
                    listener()?;
                }
                Ok(())
            }
        });

        Self { button, listeners }
    }

    /// Sets the listener that runs after a short press advances the state.
    pub fn set_press_listener(&self, listener: impl FnMut() -> anyhow::Result<()> + 'static) {
        self.listeners.borrow_mut().on_press = Some(Box::new(listener));
    }

    /// Sets the listener that runs after a long press.
    pub fn set_long_press_listener(
        &self,
        listener: impl FnMut() -> anyhow::Result<()> + 'static,
    ) {
        self.listeners.borrow_mut().on_long_press = Some(Box::new(listener));
    }

    /// Manually triggers the short-press behavior.
    pub fn press(&self) -> anyhow::Result<()> {
        self.button.press()
    }

    /// Manually triggers the long-press behavior.
    pub fn long_press(&self) -> anyhow::Result<()> {
        self.button.long_press()
    }

    #[allow(missing_docs)]
    pub fn on_button_down(&self) {
        self.button.on_button_down();
    }

    #[allow(missing_docs)]
    pub fn on_button_up(&self) -> anyhow::Result<()> {
        self.button.on_button_up()
    }
}
