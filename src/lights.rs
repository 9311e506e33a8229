// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! LED state for the controller: plain on/off lights, colored lights, and
//! adapters that make a colored light behave like a toggle.
//!
//! Every light elides writes when the value hasn't changed, so handlers can
//! set state freely without flooding the device with SYSEX traffic.

use crate::animation::BlinkingAnimation;
use crate::scheduling::Scheduler;
use delegate::delegate;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A light that is either on or off, whatever value it renders with.
pub trait ToggleLight {
    /// Whether the light currently reads as on.
    fn is_on(&self) -> bool;

    /// Sets the light on or off. The underlying device write happens only on
    /// a transition, unless `force_update` is set.
    fn set_on(&mut self, on: bool, force_update: bool) -> anyhow::Result<()>;

    /// Flips the light and returns the new state.
    fn toggle(&mut self) -> anyhow::Result<bool> {
        let on = !self.is_on();
        self.set_on(on, false)?;
        Ok(on)
    }

    /// Re-issues the device write for the current state.
    fn refresh(&mut self) -> anyhow::Result<()> {
        self.set_on(self.is_on(), true)
    }
}

/// A light driven by separate on and off commands.
pub struct OnOffLight {
    on: bool,
    on_fn: Option<Box<dyn FnMut() -> anyhow::Result<()>>>,
    off_fn: Option<Box<dyn FnMut() -> anyhow::Result<()>>>,
}
impl OnOffLight {
    #[allow(missing_docs)]
    pub fn new_with(
        on_fn: impl FnMut() -> anyhow::Result<()> + 'static,
        off_fn: impl FnMut() -> anyhow::Result<()> + 'static,
    ) -> Self {
        Self {
            on: false,
            on_fn: Some(Box::new(on_fn)),
            off_fn: Some(Box::new(off_fn)),
        }
    }

    /// A light that tracks state but drives no device. Useful in tests and
    /// as a placeholder.
    pub fn unconnected() -> Self {
        Self {
            on: false,
            on_fn: None,
            off_fn: None,
        }
    }
}
impl ToggleLight for OnOffLight {
    fn is_on(&self) -> bool {
        self.on
    }

    fn set_on(&mut self, on: bool, force_update: bool) -> anyhow::Result<()> {
        let dirty = self.on != on;
        self.on = on;
        if dirty || force_update {
            let command = if on {
                self.on_fn.as_mut()
            } else {
                self.off_fn.as_mut()
            };
            if let Some(command) = command {
                command()?;
            }
        }
        Ok(())
    }
}
impl fmt::Display for OnOffLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[OnOffLight: {}]", if self.on { "ON" } else { "OFF" })
    }
}

/// A light whose state is an integer color value.
///
/// The value might be a 24-bit RGB color or a device-specific palette index;
/// this type doesn't care. The update function, which is device dependent,
/// gives the value its meaning.
pub struct ColorLight {
    color: u32,
    update_fn: Option<Box<dyn FnMut(u32) -> anyhow::Result<()>>>,
}
impl ColorLight {
    #[allow(missing_docs)]
    pub fn new_with(update_fn: impl FnMut(u32) -> anyhow::Result<()> + 'static) -> Self {
        Self {
            color: 0,
            update_fn: Some(Box::new(update_fn)),
        }
    }

    #[allow(missing_docs)]
    pub fn unconnected() -> Self {
        Self {
            color: 0,
            update_fn: None,
        }
    }

    /// The current color value.
    pub fn value(&self) -> u32 {
        self.color
    }

    /// Whether the light shows anything at all.
    pub fn is_lit(&self) -> bool {
        self.color != 0
    }

    /// Sets the color, issuing the device write only when the value changes
    /// or `force_update` is set.
    pub fn set(&mut self, color: u32, force_update: bool) -> anyhow::Result<()> {
        let dirty = self.color != color;
        self.color = color;
        if dirty || force_update {
            if let Some(update_fn) = self.update_fn.as_mut() {
                update_fn(color)?;
            }
        }
        Ok(())
    }

    /// Re-issues the device write for the current color.
    pub fn refresh(&mut self) -> anyhow::Result<()> {
        self.set(self.color, true)
    }
}
impl fmt::Display for ColorLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ColorLight: 0x{:02X}]", self.color)
    }
}

/// Adapts a [ColorLight] to toggle semantics by designating one color value
/// as "off" and another as "on".
pub struct ColorToggleLight {
    light: ColorLight,
    off_color: u32,
    on_color: u32,
}
impl ColorToggleLight {
    #[allow(missing_docs)]
    pub fn new_with(light: ColorLight, off_color: u32, on_color: u32) -> Self {
        Self {
            light,
            off_color,
            on_color,
        }
    }

    delegate! {
        to self.light {
            /// The current color value of the wrapped light.
            pub fn value(&self) -> u32;
            /// Sets the raw color on the wrapped light.
            pub fn set(&mut self, color: u32, force_update: bool) -> anyhow::Result<()>;
            /// Re-issues the device write for the current color.
            pub fn refresh(&mut self) -> anyhow::Result<()>;
        }
    }

    #[allow(missing_docs)]
    pub fn set_off_color(&mut self, off_color: u32) -> &mut Self {
        self.off_color = off_color;
        self
    }

    #[allow(missing_docs)]
    pub fn set_on_color(&mut self, on_color: u32) -> &mut Self {
        self.on_color = on_color;
        self
    }
}
impl ToggleLight for ColorToggleLight {
    fn is_on(&self) -> bool {
        self.light.value() != self.off_color
    }

    fn set_on(&mut self, on: bool, force_update: bool) -> anyhow::Result<()> {
        let color = if on { self.on_color } else { self.off_color };
        self.light.set(color, force_update)
    }
}
impl fmt::Display for ColorToggleLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ColorToggleLight: {} | {}]",
            if self.is_on() { "ON" } else { "OFF" },
            self.light
        )
    }
}

/// A toggle light that can be put into a blinking state. Setting or toggling
/// the light manually stops any blink in progress.
pub struct BlinkableLight<L: ToggleLight + 'static> {
    light: Rc<RefCell<L>>,
    animation: BlinkingAnimation<L>,
}
impl<L: ToggleLight + 'static> BlinkableLight<L> {
    #[allow(missing_docs)]
    pub fn new_with(
        light: Rc<RefCell<L>>,
        scheduler: Rc<Scheduler>,
        blink_interval_ms: u64,
    ) -> Self {
        let animation =
            BlinkingAnimation::new_with(Rc::clone(&light), scheduler, blink_interval_ms);
        Self { light, animation }
    }

    #[allow(missing_docs)]
    pub fn start_blinking(&self) {
        self.animation.start();
    }

    #[allow(missing_docs)]
    pub fn stop_blinking(&self) {
        self.animation.stop();
    }

    #[allow(missing_docs)]
    pub fn is_blinking(&self) -> bool {
        self.animation.is_running()
    }

    #[allow(missing_docs)]
    pub fn set_blink_interval(&self, interval_ms: u64) {
        self.animation.set_interval_ms(interval_ms);
    }
}
impl<L: ToggleLight + 'static> ToggleLight for BlinkableLight<L> {
    fn is_on(&self) -> bool {
        self.light.borrow().is_on()
    }

    fn set_on(&mut self, on: bool, force_update: bool) -> anyhow::Result<()> {
        if self.animation.is_running() {
            self.animation.stop();
        }
        self.light.borrow_mut().set_on(on, force_update)
    }

    fn toggle(&mut self) -> anyhow::Result<bool> {
        if self.animation.is_running() {
            self.animation.stop();
        }
        self.light.borrow_mut().toggle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn counting_on_off() -> (Rc<RefCell<(usize, usize)>>, OnOffLight) {
        let counts = Rc::new(RefCell::new((0, 0)));
        let light = {
            let on_counts = Rc::clone(&counts);
            let off_counts = Rc::clone(&counts);
            OnOffLight::new_with(
                move || {
                    on_counts.borrow_mut().0 += 1;
                    Ok(())
                },
                move || {
                    off_counts.borrow_mut().1 += 1;
                    Ok(())
                },
            )
        };
        (counts, light)
    }

    #[test]
    fn on_off_light_elides_unchanged_writes() {
        let (counts, mut light) = counting_on_off();

        assert!(light.set_on(true, false).is_ok());
        assert!(light.set_on(true, false).is_ok());
        assert_eq!(*counts.borrow(), (1, 0));

        assert!(light.set_on(false, false).is_ok());
        assert_eq!(*counts.borrow(), (1, 1));

        // force_update pushes the current state through anyway.
        assert!(light.set_on(false, true).is_ok());
        assert_eq!(*counts.borrow(), (1, 2));
    }

    #[test]
    fn toggle_flips_and_reports() {
        let (_counts, mut light) = counting_on_off();
        assert_eq!(light.toggle().unwrap(), true);
        assert_eq!(light.toggle().unwrap(), false);
        assert!(!light.is_on());
    }

    #[test]
    fn color_light_elides_unchanged_writes() {
        let writes = Rc::new(RefCell::new(Vec::default()));
        let mut light = {
            let writes = Rc::clone(&writes);
            ColorLight::new_with(move |color| {
                writes.borrow_mut().push(color);
                Ok(())
            })
        };

        assert!(light.set(0x25, false).is_ok());
        assert!(light.set(0x25, false).is_ok());
        assert_eq!(*writes.borrow(), vec![0x25]);
        assert!(light.is_lit());

        assert!(light.refresh().is_ok());
        assert_eq!(*writes.borrow(), vec![0x25, 0x25]);
    }

    #[test]
    fn color_toggle_light_maps_bool_onto_colors() {
        let writes = Rc::new(RefCell::new(Vec::default()));
        let inner = {
            let writes = Rc::clone(&writes);
            ColorLight::new_with(move |color| {
                writes.borrow_mut().push(color);
                Ok(())
            })
        };
        let mut light = ColorToggleLight::new_with(inner, 0x00, 0x77);

        assert!(!light.is_on());
        assert_eq!(light.toggle().unwrap(), true);
        assert_eq!(light.value(), 0x77);
        assert_eq!(light.toggle().unwrap(), false);
        assert_eq!(*writes.borrow(), vec![0x77, 0x00]);

        // Any non-off color reads as on.
        assert!(light.set(0x15, false).is_ok());
        assert!(light.is_on());
    }

    #[test]
    fn displays_describe_state() {
        let mut light = OnOffLight::unconnected();
        assert_eq!(light.to_string(), "[OnOffLight: OFF]");
        assert!(light.set_on(true, false).is_ok());
        assert_eq!(light.to_string(), "[OnOffLight: ON]");
    }

    #[test]
    fn blinkable_light_stops_blinking_when_set_manually() {
        use crate::clock::{Clock, FakeClock};
        use crate::scheduling::Scheduler;

        let clock = Rc::new(FakeClock::default());
        let scheduler = Rc::new(Scheduler::new_with(Rc::clone(&clock) as Rc<dyn Clock>));
        let inner = Rc::new(RefCell::new(OnOffLight::unconnected()));
        let mut light = BlinkableLight::new_with(Rc::clone(&inner), scheduler.clone(), 100);

        light.start_blinking();
        assert!(light.is_blinking());
        clock.set(100);
        assert!(scheduler.idle().is_ok());
        assert!(light.is_on());

        // A manual write wins over the animation.
        assert!(light.set_on(false, false).is_ok());
        assert!(!light.is_blinking());
        clock.set(1000);
        assert!(scheduler.idle().is_ok());
        assert!(!light.is_on());
    }
}
