// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Ordered dispatch of [MidiMessage]s to handler functions.

use crate::matchers::{require_all, require_any, Matcher};
use crate::midi::MidiMessage;

/// A side-effecting consumer of a [MidiMessage]. Handlers may mark the
/// message handled; they may also fail, which aborts the current dispatch
/// and surfaces at the host edge.
pub type Handler = Box<dyn FnMut(&mut MidiMessage) -> anyhow::Result<()>>;

/// Dispatches each inbound message through an ordered list of handlers.
///
/// Every handler sees every message, in insertion order, regardless of
/// whether an earlier handler marked it handled. The `handled` flag is
/// consumed only by the host-edge shim; handlers that want to skip handled
/// messages test the flag themselves.
#[derive(Default)]
pub struct Processor {
    handlers: Vec<Handler>,
}
impl Processor {
    /// Appends a handler. Handlers run in the order they were added.
    pub fn add(&mut self, handler: impl FnMut(&mut MidiMessage) -> anyhow::Result<()> + 'static) -> &mut Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Sends the message through every handler in order.
    pub fn process(&mut self, message: &mut MidiMessage) -> anyhow::Result<()> {
        for handler in self.handlers.iter_mut() {
            handler(message)?;
        }
        Ok(())
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Drops every installed handler. Test hook.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

/// Turns a matcher into an if-then handler.
///
/// `when(matcher).then(handler)` produces a [Handler] that tests the matcher
/// and, on a match, runs the handler with the same message.
pub struct When {
    matcher: Matcher,
}
impl When {
    /// A handler that runs `handler` when the matcher matches.
    pub fn then(
        self,
        mut handler: impl FnMut(&mut MidiMessage) -> anyhow::Result<()> + 'static,
    ) -> Handler {
        let matcher = self.matcher;
        Box::new(move |message| {
            if matcher(message) {
                handler(message)?;
            }
            Ok(())
        })
    }

    /// A handler that runs each of `handlers`, in order, when the matcher
    /// matches.
    pub fn then_each(self, mut handlers: Vec<Handler>) -> Handler {
        let matcher = self.matcher;
        Box::new(move |message| {
            if matcher(message) {
                for handler in handlers.iter_mut() {
                    handler(message)?;
                }
            }
            Ok(())
        })
    }
}

#[allow(missing_docs)]
pub fn when(matcher: Matcher) -> When {
    When { matcher }
}

/// Sugar for `when(require_all(...))`.
pub fn when_all(matchers: Vec<Matcher>) -> When {
    when(require_all(matchers))
}

/// Sugar for `when(require_any(...))`.
pub fn when_any(matchers: Vec<Matcher>) -> When {
    when(require_any(matchers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::{data1_eq, status_eq};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn message(status: u8, data1: u8, data2: u8) -> MidiMessage {
        MidiMessage::new_with(status, data1, data2, 0)
    }

    #[test]
    fn handlers_run_in_insertion_order() {
        let order = Rc::new(RefCell::new(Vec::default()));
        let mut processor = Processor::default();
        for label in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            processor.add(move |_| {
                order.borrow_mut().push(label);
                Ok(())
            });
        }

        assert!(processor.process(&mut message(0x90, 0, 0)).is_ok());
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn marking_handled_does_not_stop_dispatch() {
        let seen_handled = Rc::new(RefCell::new(None));
        let mut processor = Processor::default();
        processor.add(|m| {
            m.mark_handled();
            Ok(())
        });
        {
            let seen_handled = Rc::clone(&seen_handled);
            processor.add(move |m| {
                *seen_handled.borrow_mut() = Some(m.handled);
                Ok(())
            });
        }

        let mut m = message(0x90, 0, 0);
        assert!(processor.process(&mut m).is_ok());
        assert!(m.handled);
        // The later handler ran, and saw the earlier handler's disposition.
        assert_eq!(*seen_handled.borrow(), Some(true));
    }

    #[test]
    fn when_gates_on_the_matcher() {
        let hits = Rc::new(RefCell::new(0));
        let handler = {
            let hits = Rc::clone(&hits);
            when(status_eq(0x90)).then(move |_| {
                *hits.borrow_mut() += 1;
                Ok(())
            })
        };

        let mut processor = Processor::default();
        processor.add(handler);
        assert!(processor.process(&mut message(0x90, 0, 0)).is_ok());
        assert!(processor.process(&mut message(0x80, 0, 0)).is_ok());
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn when_all_requires_every_matcher() {
        let hits = Rc::new(RefCell::new(0));
        let handler = {
            let hits = Rc::clone(&hits);
            when_all(vec![status_eq(0x90), data1_eq(0x30)]).then(move |_| {
                *hits.borrow_mut() += 1;
                Ok(())
            })
        };
        let mut processor = Processor::default();
        processor.add(handler);

        assert!(processor.process(&mut message(0x90, 0x30, 0)).is_ok());
        assert!(processor.process(&mut message(0x90, 0x31, 0)).is_ok());
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn when_any_accepts_any_matcher() {
        let hits = Rc::new(RefCell::new(0));
        let handler = {
            let hits = Rc::clone(&hits);
            when_any(vec![status_eq(0x90), status_eq(0x80)]).then(move |_| {
                *hits.borrow_mut() += 1;
                Ok(())
            })
        };
        let mut processor = Processor::default();
        processor.add(handler);

        assert!(processor.process(&mut message(0x90, 0, 0)).is_ok());
        assert!(processor.process(&mut message(0x80, 0, 0)).is_ok());
        assert!(processor.process(&mut message(0xB0, 0, 0)).is_ok());
        assert_eq!(*hits.borrow(), 2);
    }

    #[test]
    fn then_each_runs_all_targets_in_order() {
        let order = Rc::new(RefCell::new(Vec::default()));
        let targets: Vec<Handler> = ["a", "b"]
            .iter()
            .map(|label| {
                let order = Rc::clone(&order);
                let handler: Handler = Box::new(move |_| {
                    order.borrow_mut().push(*label);
                    Ok(())
                });
                handler
            })
            .collect();

        let mut processor = Processor::default();
        processor.add(when(status_eq(0x90)).then_each(targets));
        assert!(processor.process(&mut message(0x90, 0, 0)).is_ok());
        assert_eq!(*order.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn failing_handler_aborts_the_dispatch() {
        let reached = Rc::new(RefCell::new(false));
        let mut processor = Processor::default();
        processor.add(|_| Err(anyhow::anyhow!("adapter exploded")));
        {
            let reached = Rc::clone(&reached);
            processor.add(move |_| {
                *reached.borrow_mut() = true;
                Ok(())
            });
        }

        assert!(processor.process(&mut message(0x90, 0, 0)).is_err());
        assert!(!*reached.borrow());
    }
}
