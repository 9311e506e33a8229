// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Finite state values shared between the device and the DAW.
//!
//! A state can sync its value from a source (pull) and to a destination
//! (push). Examples: the DAW's recording status, which decides whether the
//! record light is lit; or which function a bank of buttons currently
//! controls.

/// Something whose value can be stepped forward or backward through a closed
/// cycle, publishing the change as it goes. Buttons drive this without
/// caring what the underlying value type is.
pub trait Cycles {
    /// Steps to the next (or, when `reverse`, previous) value and pushes it.
    fn advance(&mut self, reverse: bool) -> anyhow::Result<()>;
}

/// A state variable restricted to a fixed list of values that can be cycled
/// through in either direction.
pub struct IterableState<T: Clone + PartialEq> {
    name: String,
    states: Vec<T>,
    index: usize,
    pull_fn: Option<Box<dyn FnMut() -> T>>,
    push_fn: Option<Box<dyn FnMut(&T) -> anyhow::Result<()>>>,
}
impl<T: Clone + PartialEq> IterableState<T> {
    #[allow(missing_docs)]
    pub fn builder(name: &str) -> IterableStateBuilder<T> {
        IterableStateBuilder::new(name)
    }

    /// The name of the state.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current value.
    pub fn value(&self) -> &T {
        &self.states[self.index]
    }

    /// Steps to the next value and returns it.
    pub fn toggle_next(&mut self) -> &T {
        self.index = (self.index + 1) % self.states.len();
        self.value()
    }

    /// Steps to the previous value and returns it.
    pub fn toggle_prev(&mut self) -> &T {
        self.index = (self.index + self.states.len() - 1) % self.states.len();
        self.value()
    }

    /// Publishes the current value to its destination, if one was given.
    pub fn push(&mut self) -> anyhow::Result<()> {
        let value = self.states[self.index].clone();
        if let Some(push_fn) = self.push_fn.as_mut() {
            push_fn(&value)?;
        }
        Ok(())
    }

    /// Re-reads the value from its source, if one was given. Returns whether
    /// the value changed.
    pub fn pull(&mut self) -> bool {
        let Some(pull_fn) = self.pull_fn.as_mut() else {
            return false;
        };
        let value = pull_fn();
        let index = self
            .states
            .iter()
            .position(|candidate| *candidate == value)
            .expect("pulled a value that is not one of this state's values");
        let changed = index != self.index;
        self.index = index;
        changed
    }
}
impl<T: Clone + PartialEq> Cycles for IterableState<T> {
    fn advance(&mut self, reverse: bool) -> anyhow::Result<()> {
        if reverse {
            self.toggle_prev();
        } else {
            self.toggle_next();
        }
        self.push()
    }
}
impl<T: Clone + PartialEq + std::fmt::Debug> std::fmt::Debug for IterableState<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={:?}", self.name, self.value())
    }
}

/// Assembles an [IterableState].
pub struct IterableStateBuilder<T: Clone + PartialEq> {
    name: String,
    states: Vec<T>,
    initial: Option<T>,
    pull_fn: Option<Box<dyn FnMut() -> T>>,
    push_fn: Option<Box<dyn FnMut(&T) -> anyhow::Result<()>>>,
}
impl<T: Clone + PartialEq> IterableStateBuilder<T> {
    #[allow(missing_docs)]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            states: Vec::default(),
            initial: None,
            pull_fn: None,
            push_fn: None,
        }
    }

    #[allow(missing_docs)]
    pub fn add_state(mut self, state: T) -> Self {
        self.states.push(state);
        self
    }

    /// Adds every value the iterator yields, e.g. a strum `EnumIter`.
    pub fn cycling(mut self, states: impl IntoIterator<Item = T>) -> Self {
        self.states.extend(states);
        self
    }

    /// The value to start at. Defaults to the first state added.
    pub fn default_to(mut self, state: T) -> Self {
        self.initial = Some(state);
        self
    }

    #[allow(missing_docs)]
    pub fn pull_with(mut self, pull_fn: impl FnMut() -> T + 'static) -> Self {
        self.pull_fn = Some(Box::new(pull_fn));
        self
    }

    #[allow(missing_docs)]
    pub fn push_with(
        mut self,
        push_fn: impl FnMut(&T) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.push_fn = Some(Box::new(push_fn));
        self
    }

    /// Builds the state.
    ///
    /// Panics if no states were added, or if the default value is not one of
    /// them. Those are configuration mistakes, not runtime conditions.
    pub fn build(self) -> IterableState<T> {
        assert!(
            !self.states.is_empty(),
            "an IterableState needs at least one state"
        );
        let index = match self.initial {
            Some(initial) => self
                .states
                .iter()
                .position(|candidate| *candidate == initial)
                .expect("the default value must be one of the states"),
            None => 0,
        };
        IterableState {
            name: self.name,
            states: self.states,
            index,
            pull_fn: self.pull_fn,
            push_fn: self.push_fn,
        }
    }
}
