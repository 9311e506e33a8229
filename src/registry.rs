// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Central record of control-surface state: which buttons are held, and the
//! last decoded encoder and slider values.

use rustc_hash::FxHashMap;

/// Default-returning maps of control state, written by the input bindings on
/// the MIDI-dispatch path and read by matchers and handlers. Unknown buttons
/// read as not-held; unknown encoders and sliders read as 0.0. Updates are
/// last-write-wins.
#[derive(Debug, Default)]
pub struct Registry {
    buttons: FxHashMap<String, bool>,
    encoders: FxHashMap<String, f64>,
    sliders: FxHashMap<String, f64>,
}
impl Registry {
    /// Whether the named button is currently held.
    pub fn is_button_down(&self, name: &str) -> bool {
        self.buttons.get(name).copied().unwrap_or(false)
    }

    /// Records a button transition. Releasing forgets the entry.
    pub fn set_button_down(&mut self, name: &str, down: bool) {
        if down {
            self.buttons.insert(name.to_string(), true);
        } else {
            self.buttons.remove(name);
        }
    }

    /// The names of all currently-held buttons.
    pub fn buttons_down(&self) -> impl Iterator<Item = &str> {
        self.buttons.keys().map(String::as_str)
    }

    /// The last decoded value for the named encoder.
    pub fn encoder_value(&self, name: &str) -> f64 {
        self.encoders.get(name).copied().unwrap_or(0.0)
    }

    #[allow(missing_docs)]
    pub fn set_encoder_value(&mut self, name: &str, value: f64) {
        self.encoders.insert(name.to_string(), value);
    }

    /// The last decoded value for the named slider.
    pub fn slider_value(&self, name: &str) -> f64 {
        self.sliders.get(name).copied().unwrap_or(0.0)
    }

    #[allow(missing_docs)]
    pub fn set_slider_value(&mut self, name: &str, value: f64) {
        self.sliders.insert(name.to_string(), value);
    }

    /// Forgets everything. Test hook.
    pub fn clear(&mut self) {
        self.buttons.clear();
        self.encoders.clear();
        self.sliders.clear();
    }
}
