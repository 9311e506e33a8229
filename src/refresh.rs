// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Refresh-flag broadcast: the host tells the runtime which parts of the
//! surface are stale, and registered listeners decide whether the news
//! concerns them.

use derive_more::{BitOr, BitOrAssign, From};

/// A bitmask naming the parts of the control surface that need re-rendering.
/// Listeners mask-test against the constants below.
#[derive(
    BitOr, BitOrAssign, Clone, Copy, Debug, Default, Eq, From, Hash, PartialEq,
)]
pub struct RefreshFlags(pub u32);
#[allow(missing_docs)]
impl RefreshFlags {
    pub const MIXER_SELECTION: Self = Self(1);
    pub const MIXER_DISPLAY: Self = Self(2);
    pub const MIXER_CONTROLS: Self = Self(4);
    pub const REMOTE_LINKS: Self = Self(16);
    pub const FOCUSED_WINDOW: Self = Self(32);
    pub const PERFORMANCE: Self = Self(64);
    pub const CONTROLLER_LEDS: Self = Self(256);

    /// All bits set; refreshes everything.
    pub const FULL: Self = Self(u32::MAX);

    /// Whether any bit is shared with `other`.
    pub fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

/// A callback invoked with the flags of each refresh broadcast.
pub type RefreshListener = Box<dyn FnMut(RefreshFlags) -> anyhow::Result<()>>;

/// Broadcasts refresh flags to an ordered list of listeners.
#[derive(Default)]
pub struct RefreshManager {
    listeners: Vec<RefreshListener>,
}
impl RefreshManager {
    /// Appends a listener. Listeners are notified in the order added.
    pub fn add(
        &mut self,
        listener: impl FnMut(RefreshFlags) -> anyhow::Result<()> + 'static,
    ) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Notifies every listener of the given flags.
    pub fn refresh(&mut self, flags: RefreshFlags) -> anyhow::Result<()> {
        for listener in self.listeners.iter_mut() {
            listener(flags)?;
        }
        Ok(())
    }

    /// Drops every listener. Test hook.
    pub fn clear(&mut self) -> &mut Self {
        self.listeners.clear();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn full_refresh_intersects_every_flag() {
        for flag in [
            RefreshFlags::MIXER_SELECTION,
            RefreshFlags::MIXER_DISPLAY,
            RefreshFlags::MIXER_CONTROLS,
            RefreshFlags::REMOTE_LINKS,
            RefreshFlags::FOCUSED_WINDOW,
            RefreshFlags::PERFORMANCE,
            RefreshFlags::CONTROLLER_LEDS,
        ] {
            assert!(RefreshFlags::FULL.intersects(flag));
        }
    }

    #[test]
    fn flags_combine_with_bitor() {
        let flags = RefreshFlags::MIXER_DISPLAY | RefreshFlags::CONTROLLER_LEDS;
        assert!(flags.intersects(RefreshFlags::MIXER_DISPLAY));
        assert!(flags.intersects(RefreshFlags::CONTROLLER_LEDS));
        assert!(!flags.intersects(RefreshFlags::FOCUSED_WINDOW));
    }

    #[test]
    fn listeners_hear_broadcasts_in_order() {
        let heard = Rc::new(RefCell::new(Vec::default()));
        let mut manager = RefreshManager::default();
        for label in ["lights", "display"] {
            let heard = Rc::clone(&heard);
            manager.add(move |flags| {
                heard.borrow_mut().push((label, flags));
                Ok(())
            });
        }

        assert!(manager.refresh(RefreshFlags::PERFORMANCE).is_ok());
        assert_eq!(
            *heard.borrow(),
            vec![
                ("lights", RefreshFlags::PERFORMANCE),
                ("display", RefreshFlags::PERFORMANCE)
            ]
        );

        manager.clear();
        assert!(manager.refresh(RefreshFlags::FULL).is_ok());
        assert_eq!(heard.borrow().len(), 2);
    }
}
