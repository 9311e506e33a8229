// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Exclusive channel selection from a bank of matchers.

use crate::daw::ChannelRack;
use crate::matchers::Matcher;
use crate::midi::MidiMessage;
use crate::panel::Panel;
use crate::refresh::RefreshFlags;
use std::cell::RefCell;
use std::rc::Rc;

/// Called after a refresh with the button index now selected (None when the
/// selected channel maps to no button) and the selected channel index.
pub type SelectionOutputFn = Box<dyn FnMut(Option<usize>, usize) -> anyhow::Result<()>>;

/// Selects the active channel from a bank of N matchers: when the i-th
/// matcher is the first to match, channel `base + i` becomes the selection.
///
/// The selection itself renders nothing. The DAW answers every selection
/// change with a refresh, and the output function runs then, so a selection
/// made from the DAW side lights up the same way as one made from a pad.
pub struct ChannelSelector {
    attached: bool,
    matchers: Vec<Matcher>,
    base_index: usize,
    rack: Rc<RefCell<dyn ChannelRack>>,
    output_fn: SelectionOutputFn,
}
impl ChannelSelector {
    #[allow(missing_docs)]
    pub fn new_with(
        matchers: Vec<Matcher>,
        rack: Rc<RefCell<dyn ChannelRack>>,
        output_fn: impl FnMut(Option<usize>, usize) -> anyhow::Result<()> + 'static,
    ) -> Self {
        Self {
            attached: true,
            matchers,
            base_index: 0,
            rack,
            output_fn: Box::new(output_fn),
        }
    }

    /// The channel index the first matcher selects.
    pub fn set_base_index(&mut self, base_index: usize) {
        self.base_index = base_index;
    }

    /// The button index for the currently selected channel, if the channel
    /// falls within this selector's bank.
    pub fn current_button_index(&self) -> Option<usize> {
        let channel = self.rack.borrow().selected_channel();
        channel
            .checked_sub(self.base_index)
            .filter(|index| *index < self.matchers.len())
    }
}
impl Panel for ChannelSelector {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    fn handle_message(&mut self, message: &mut MidiMessage) -> anyhow::Result<()> {
        for (index, matcher) in self.matchers.iter().enumerate() {
            if matcher(message) {
                message.mark_handled();
                let channel = self.base_index + index;
                if channel < self.rack.borrow().channel_count() {
                    self.rack.borrow_mut().select_channel(channel);
                }
                // Rendering waits for the refresh the DAW sends back.
                return Ok(());
            }
        }
        Ok(())
    }

    fn render(&mut self, flags: RefreshFlags) -> anyhow::Result<()> {
        if !flags.intersects(RefreshFlags::FOCUSED_WINDOW) {
            return Ok(());
        }
        let channel = self.rack.borrow().selected_channel();
        let button_index = self.current_button_index();
        (self.output_fn)(button_index, channel)
    }
}
