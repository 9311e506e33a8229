// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Declarative input bindings: wire a matcher to a user handler at init
//! time, with the [Registry](crate::registry::Registry) bookkeeping handled
//! automatically.
//!
//! Each binding shape takes its own handler signature; the adapting closure
//! installed into the processor is what tells them apart.

use crate::matchers::Matcher;
use crate::midi::{self, MidiMessage};
use crate::processor::{when, when_all};
use crate::runtime::Runtime;
use std::cell::RefCell;
use std::rc::Rc;

impl Runtime {
    /// Binds a pressable control. `on_matcher` and `off_matcher` classify
    /// the press and release events; the handler receives the message and
    /// whether this was the press. With a name, the registry's button-down
    /// map tracks the held state.
    pub fn bind_button(
        &mut self,
        name: Option<&str>,
        on_matcher: Matcher,
        off_matcher: Matcher,
        handler: impl FnMut(&mut MidiMessage, bool) -> anyhow::Result<()> + 'static,
    ) {
        let handler = Rc::new(RefCell::new(handler));
        let name: Option<String> = name.map(str::to_string);

        {
            let handler = Rc::clone(&handler);
            let registry = Rc::clone(&self.registry);
            let name = name.clone();
            self.processor.add(when(on_matcher).then(move |message| {
                if let Some(name) = name.as_deref() {
                    registry.borrow_mut().set_button_down(name, true);
                }
                (*handler.borrow_mut())(message, true)
            }));
        }
        {
            let registry = Rc::clone(&self.registry);
            self.processor.add(when(off_matcher).then(move |message| {
                if let Some(name) = name.as_deref() {
                    registry.borrow_mut().set_button_down(name, false);
                }
                (*handler.borrow_mut())(message, false)
            }));
        }
    }

    /// Binds an encoder. On each matching message the value is decoded
    /// (absolute position normalized to [0, 1], or a signed delta when
    /// `infinite`), recorded in the registry, and passed to the handler.
    pub fn bind_encoder(
        &mut self,
        name: &str,
        matcher: Matcher,
        infinite: bool,
        mut handler: impl FnMut(&MidiMessage, f64) -> anyhow::Result<()> + 'static,
    ) {
        let registry = Rc::clone(&self.registry);
        let name = name.to_string();
        self.processor.add(when(matcher).then(move |message| {
            let value = if infinite {
                midi::relative_encoded_value(message)
            } else {
                midi::encoded_value(message)
            };
            registry.borrow_mut().set_encoder_value(&name, value);
            handler(message, value)
        }));
    }

    /// Binds a slider: like an absolute encoder, recorded in the registry's
    /// slider map.
    pub fn bind_slider(
        &mut self,
        name: &str,
        matcher: Matcher,
        mut handler: impl FnMut(&MidiMessage, f64) -> anyhow::Result<()> + 'static,
    ) {
        let registry = Rc::clone(&self.registry);
        let name = name.to_string();
        self.processor.add(when(matcher).then(move |message| {
            let value = midi::encoded_value(message);
            registry.borrow_mut().set_slider_value(&name, value);
            handler(message, value)
        }));
    }

    /// Binds a plain matcher-to-handler trigger with no registry
    /// bookkeeping. All matchers must match.
    pub fn trigger_when(
        &mut self,
        matchers: Vec<Matcher>,
        handler: impl FnMut(&mut MidiMessage) -> anyhow::Result<()> + 'static,
    ) {
        self.processor.add(when_all(matchers).then(handler));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::matchers::{data1_eq, is_off, is_on, require_all, status_eq};
    use float_cmp::approx_eq;

    fn runtime() -> Runtime {
        Runtime::new_with(Rc::new(FakeClock::default()))
    }

    #[test]
    fn button_binding_tracks_held_state() {
        let mut runtime = runtime();
        let presses = Rc::new(RefCell::new(Vec::default()));
        {
            let presses = Rc::clone(&presses);
            runtime.bind_button(
                Some("play"),
                require_all(vec![status_eq(0xB0), data1_eq(0x73), is_on()]),
                require_all(vec![status_eq(0xB0), data1_eq(0x73), is_off()]),
                move |_, pressed| {
                    presses.borrow_mut().push(pressed);
                    Ok(())
                },
            );
        }

        assert!(runtime.on_midi_message(0xB0, 0x73, 0x7F).is_ok());
        assert!(runtime.registry().borrow().is_button_down("play"));

        assert!(runtime.on_midi_message(0xB0, 0x73, 0x00).is_ok());
        assert!(!runtime.registry().borrow().is_button_down("play"));

        // Unrelated traffic doesn't reach the handler.
        assert!(runtime.on_midi_message(0xB0, 0x74, 0x7F).is_ok());
        assert_eq!(*presses.borrow(), vec![true, false]);
    }

    #[test]
    fn anonymous_buttons_skip_the_registry() {
        let mut runtime = runtime();
        runtime.bind_button(
            None,
            require_all(vec![status_eq(0x90), is_on()]),
            require_all(vec![status_eq(0x90), is_off()]),
            |_, _| Ok(()),
        );
        assert!(runtime.on_midi_message(0x90, 0x30, 0x7F).is_ok());
        assert_eq!(runtime.registry().borrow().buttons_down().count(), 0);
    }

    #[test]
    fn button_handlers_may_mark_messages_handled() {
        let mut runtime = runtime();
        runtime.bind_button(
            Some("pad"),
            require_all(vec![status_eq(0x99), is_on()]),
            require_all(vec![status_eq(0x99), is_off()]),
            |message, _| {
                message.mark_handled();
                Ok(())
            },
        );
        assert!(runtime.on_midi_message(0x99, 0x24, 0x7F).unwrap());
    }

    #[test]
    fn encoder_binding_decodes_and_records() {
        let mut runtime = runtime();
        let values = Rc::new(RefCell::new(Vec::default()));
        {
            let values = Rc::clone(&values);
            runtime.bind_encoder(
                "pan",
                require_all(vec![status_eq(0xB0), data1_eq(0x15)]),
                false,
                move |_, value| {
                    values.borrow_mut().push(value);
                    Ok(())
                },
            );
        }

        assert!(runtime.on_midi_message(0xB0, 0x15, 0x7F).is_ok());
        assert_eq!(runtime.registry().borrow().encoder_value("pan"), 1.0);
        assert!(runtime.on_midi_message(0xB0, 0x15, 0x00).is_ok());
        assert_eq!(runtime.registry().borrow().encoder_value("pan"), 0.0);
        assert_eq!(values.borrow().len(), 2);
    }

    #[test]
    fn infinite_encoders_record_the_last_delta() {
        let mut runtime = runtime();
        runtime.bind_encoder(
            "jog",
            require_all(vec![status_eq(0xB0), data1_eq(0x16)]),
            true,
            |_, _| Ok(()),
        );

        assert!(runtime.on_midi_message(0xB0, 0x16, 0x02).is_ok());
        assert!(approx_eq!(
            f64,
            runtime.registry().borrow().encoder_value("jog"),
            2.0 / 127.0
        ));

        // The registry records the last delta; it never accumulates.
        assert!(runtime.on_midi_message(0xB0, 0x16, 0x42).is_ok());
        assert!(approx_eq!(
            f64,
            runtime.registry().borrow().encoder_value("jog"),
            -2.0 / 127.0
        ));
    }

    #[test]
    fn slider_binding_records_position() {
        let mut runtime = runtime();
        runtime.bind_slider(
            "volume",
            require_all(vec![status_eq(0xB0), data1_eq(0x07)]),
            |_, _| Ok(()),
        );
        assert!(runtime.on_midi_message(0xB0, 0x07, 0x7F).is_ok());
        assert_eq!(runtime.registry().borrow().slider_value("volume"), 1.0);
    }

    #[test]
    fn trigger_when_requires_all_matchers() {
        let mut runtime = runtime();
        let hits = Rc::new(RefCell::new(0));
        {
            let hits = Rc::clone(&hits);
            runtime.trigger_when(vec![status_eq(0x90), data1_eq(0x30)], move |_| {
                *hits.borrow_mut() += 1;
                Ok(())
            });
        }

        assert!(runtime.on_midi_message(0x90, 0x30, 0x7F).is_ok());
        assert!(runtime.on_midi_message(0x90, 0x31, 0x7F).is_ok());
        assert_eq!(*hits.borrow(), 1);
    }
}
