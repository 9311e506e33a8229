// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! A named bank of pad LEDs addressed by their device ids.

use crate::lights::{ColorLight, ColorToggleLight, ToggleLight};
use crate::midi::MidiMessage;
use crate::panel::Panel;
use crate::refresh::RefreshFlags;
use std::cell::RefCell;
use std::rc::Rc;

/// A bank of [ColorToggleLight]s, one per LED id, that re-forces its state
/// to the device whenever a CONTROLLER_LEDS refresh arrives (the DAW may
/// have clobbered the LEDs in the meantime).
pub struct LightPanel {
    attached: bool,
    name: String,
    led_ids: Vec<u8>,
    lights: Vec<ColorToggleLight>,
}
impl LightPanel {
    /// Builds a bank over `led_ids`. `light_fn` writes one (LED id, color)
    /// update to the device; each light gets its own id baked in.
    pub fn new_with(
        name: &str,
        led_ids: Vec<u8>,
        light_fn: impl FnMut(u8, u32) -> anyhow::Result<()> + 'static,
        off_color: u32,
        on_color: u32,
    ) -> Self {
        let light_fn = Rc::new(RefCell::new(light_fn));
        let lights = led_ids
            .iter()
            .map(|&led_id| {
                let light_fn = Rc::clone(&light_fn);
                ColorToggleLight::new_with(
                    ColorLight::new_with(move |color| (*light_fn.borrow_mut())(led_id, color)),
                    off_color,
                    on_color,
                )
            })
            .collect();
        Self {
            attached: true,
            name: name.to_string(),
            led_ids,
            lights,
        }
    }

    #[allow(missing_docs)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Whether the bank contains the LED.
    pub fn contains(&self, led_id: u8) -> bool {
        self.index_of(led_id).is_some()
    }

    /// The bank index of the LED id.
    pub fn index_of(&self, led_id: u8) -> Option<usize> {
        self.led_ids.iter().position(|&candidate| candidate == led_id)
    }

    /// The light at a bank index.
    pub fn light_mut(&mut self, index: usize) -> &mut ColorToggleLight {
        &mut self.lights[index]
    }

    /// Sets every light in the bank to the raw color.
    pub fn set_all(&mut self, color: u32) -> anyhow::Result<()> {
        for light in self.lights.iter_mut() {
            light.set(color, false)?;
        }
        Ok(())
    }

    /// Toggles every light in the bank to the given state.
    pub fn set_all_on(&mut self, on: bool) -> anyhow::Result<()> {
        for light in self.lights.iter_mut() {
            light.set_on(on, false)?;
        }
        Ok(())
    }

    #[allow(missing_docs)]
    pub fn set_all_off_color(&mut self, off_color: u32) {
        for light in self.lights.iter_mut() {
            light.set_off_color(off_color);
        }
    }

    #[allow(missing_docs)]
    pub fn set_all_on_color(&mut self, on_color: u32) {
        for light in self.lights.iter_mut() {
            light.set_on_color(on_color);
        }
    }
}
impl Panel for LightPanel {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    fn handle_message(&mut self, _message: &mut MidiMessage) -> anyhow::Result<()> {
        Ok(())
    }

    fn render(&mut self, flags: RefreshFlags) -> anyhow::Result<()> {
        if !flags.intersects(RefreshFlags::CONTROLLER_LEDS) {
            return Ok(());
        }
        for light in self.lights.iter_mut() {
            light.refresh()?;
        }
        Ok(())
    }
}
