// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! A [Panel] groups the controls and outputs that drive one DAW function:
//! it consumes matching MIDI messages and re-renders its lights and
//! displays when a refresh says they're stale.
//!
//! Panels can be attached or detached at runtime, which lets several panels
//! share the same physical controls across different modes.

use crate::midi::MidiMessage;
use crate::refresh::RefreshFlags;

/// An attachable message consumer with a refresh hook.
///
/// Implementors provide [Panel::handle_message] and [Panel::render] plus the
/// attached-flag accessors; the provided methods add the attach/detach
/// gating. Panels start attached.
pub trait Panel {
    #[allow(missing_docs)]
    fn is_attached(&self) -> bool;

    #[allow(missing_docs)]
    fn set_attached(&mut self, attached: bool);

    /// Reacts to a message. Called only while attached.
    fn handle_message(&mut self, message: &mut MidiMessage) -> anyhow::Result<()>;

    /// Re-renders whatever the flags say is stale. Called only while
    /// attached.
    fn render(&mut self, flags: RefreshFlags) -> anyhow::Result<()>;

    /// Attaches the panel and re-renders everything it owns. Idempotent.
    fn attach(&mut self) -> anyhow::Result<()> {
        self.set_attached(true);
        self.refresh(RefreshFlags::FULL)
    }

    /// Detaches the panel; subsequent messages and refreshes are dropped.
    /// Idempotent.
    fn detach(&mut self) {
        self.set_attached(false);
    }

    /// Feeds a message to the panel, which ignores it while detached.
    fn process(&mut self, message: &mut MidiMessage) -> anyhow::Result<()> {
        if self.is_attached() {
            self.handle_message(message)?;
        }
        Ok(())
    }

    /// Asks the panel to re-render, which it ignores while detached.
    fn refresh(&mut self, flags: RefreshFlags) -> anyhow::Result<()> {
        if self.is_attached() {
            self.render(flags)?;
        }
        Ok(())
    }
}
