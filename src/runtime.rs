// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! The [Runtime] owns the control-surface machinery (scheduler, processor,
//! registry, refresh manager) and translates the host's lifecycle callbacks
//! into calls on it.
//!
//! There are no process-wide singletons: an embedding script (or a test)
//! builds its own `Runtime`, installs bindings and panels, then forwards
//! the host's init/idle/midi/refresh callbacks to it.

use crate::clock::{Clock, WallClock};
use crate::daw::Device;
use crate::midi::MidiMessage;
use crate::panel::Panel;
use crate::processor::Processor;
use crate::refresh::{RefreshFlags, RefreshManager};
use crate::registry::Registry;
use crate::scheduling::Scheduler;
use log::{debug, trace};
use std::cell::RefCell;
use std::rc::Rc;

/// The single ambient context for a control-surface script.
pub struct Runtime {
    clock: Rc<dyn Clock>,
    scheduler: Rc<Scheduler>,
    pub(crate) processor: Processor,
    pub(crate) registry: Rc<RefCell<Registry>>,
    refresh_manager: RefreshManager,
}
impl Default for Runtime {
    fn default() -> Self {
        Self::new_with(Rc::new(WallClock::default()))
    }
}
impl Runtime {
    /// A runtime on the given clock. Tests pass a
    /// [FakeClock](crate::clock::FakeClock).
    pub fn new_with(clock: Rc<dyn Clock>) -> Self {
        let scheduler = Rc::new(Scheduler::new_with(Rc::clone(&clock)));
        Self {
            clock,
            scheduler,
            processor: Processor::default(),
            registry: Rc::new(RefCell::new(Registry::default())),
            refresh_manager: RefreshManager::default(),
        }
    }

    #[allow(missing_docs)]
    pub fn clock(&self) -> &Rc<dyn Clock> {
        &self.clock
    }

    /// The scheduler deferred work runs on. Animations, buttons, and the
    /// recorder keep their own clone.
    pub fn scheduler(&self) -> &Rc<Scheduler> {
        &self.scheduler
    }

    #[allow(missing_docs)]
    pub fn registry(&self) -> &Rc<RefCell<Registry>> {
        &self.registry
    }

    #[allow(missing_docs)]
    pub fn processor_mut(&mut self) -> &mut Processor {
        &mut self.processor
    }

    #[allow(missing_docs)]
    pub fn refresh_manager_mut(&mut self) -> &mut RefreshManager {
        &mut self.refresh_manager
    }

    /// Registers a panel with the message processor and the refresh
    /// broadcast. The panel keeps deciding for itself whether it is
    /// attached.
    pub fn register_panel<P: Panel + 'static>(&mut self, panel: &Rc<RefCell<P>>) {
        {
            let panel = Rc::clone(panel);
            self.processor.add(move |message| panel.borrow_mut().process(message));
        }
        {
            let panel = Rc::clone(panel);
            self.refresh_manager
                .add(move |flags| panel.borrow_mut().refresh(flags));
        }
    }

    /// Host callback: the script was just loaded. Sends the device's
    /// initialization SYSEX, if any, and broadcasts a full refresh so that
    /// everything registered so far renders its initial state.
    pub fn on_init(&mut self, device: &mut dyn Device, init_command: &[u8]) -> anyhow::Result<()> {
        if !init_command.is_empty() {
            device.send_sysex(init_command)?;
        }
        debug!("runtime initialized on port {}", device.port_number());
        self.refresh_manager.refresh(RefreshFlags::FULL)
    }

    /// Host callback: the periodic idle tick. Drains due scheduler work.
    pub fn on_idle(&mut self) -> anyhow::Result<()> {
        self.scheduler.idle()
    }

    /// Host callback: an inbound MIDI event. Stamps it with the current
    /// time, dispatches it, and returns whether some handler consumed it;
    /// the host copies that back to suppress its default handling.
    pub fn on_midi_message(
        &mut self,
        status: u8,
        data1: u8,
        data2: u8,
    ) -> anyhow::Result<bool> {
        let mut message = MidiMessage::new_with(status, data1, data2, self.clock.now_ms());
        trace!("dispatching {message}");
        self.processor.process(&mut message)?;
        Ok(message.handled)
    }

    /// Host callback: targeted refresh with the host's flag bits.
    pub fn on_refresh(&mut self, flags: RefreshFlags) -> anyhow::Result<()> {
        self.refresh_manager.refresh(flags)
    }

    /// Host callback: the host wants everything re-rendered.
    pub fn on_full_refresh(&mut self) -> anyhow::Result<()> {
        self.refresh_manager.refresh(RefreshFlags::FULL)
    }
}
