// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Character displays: a fixed-size grid, windows onto it, marquee
//! scrolling for overlong lines, and named pages with temporary overlays.
//!
//! Lines are fixed-width; assigning a line pads or truncates it to fit.
//! Mutations stay in memory until [Display::push] sends the buffer to the
//! hardware.

use crate::scheduling::{Scheduler, TaskHandle};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::rc::Rc;

/// A rectangular field of characters: `height` lines of `width` characters.
pub trait Display {
    /// Characters per line.
    fn width(&self) -> usize;

    /// Number of lines.
    fn height(&self) -> usize;

    /// The current contents of a line.
    fn line(&self, index: usize) -> String;

    /// Replaces a line, padding or truncating to the display width.
    fn set_line(&mut self, index: usize, text: &str);

    /// Sends the buffered contents to the hardware.
    fn push(&mut self) -> anyhow::Result<()>;
}

/// Receives the full line buffer on each push.
pub type PushFn = Box<dyn FnMut(&[String]) -> anyhow::Result<()>>;

fn fix_width(text: &str, width: usize) -> String {
    let mut line: String = text.chars().take(width).collect();
    while line.chars().count() < width {
        line.push(' ');
    }
    line
}

/// The basic in-memory display: it holds the character grid and pushes it to
/// the device on demand.
pub struct DirectDisplay {
    lines: Vec<String>,
    width: usize,
    push_fn: Option<PushFn>,
}
impl DirectDisplay {
    #[allow(missing_docs)]
    pub fn builder() -> DirectDisplayBuilder {
        DirectDisplayBuilder::default()
    }
}
impl Display for DirectDisplay {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, index: usize) -> String {
        self.lines[index].clone()
    }

    fn set_line(&mut self, index: usize, text: &str) {
        self.lines[index] = fix_width(text, self.width);
    }

    fn push(&mut self) -> anyhow::Result<()> {
        if let Some(push_fn) = self.push_fn.as_mut() {
            push_fn(&self.lines)?;
        }
        Ok(())
    }
}
impl std::fmt::Display for DirectDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

/// Assembles a [DirectDisplay]. Defaults to the common 2x16 character LCD.
pub struct DirectDisplayBuilder {
    height: usize,
    width: usize,
    push_fn: Option<PushFn>,
}
impl Default for DirectDisplayBuilder {
    fn default() -> Self {
        Self {
            height: 2,
            width: 16,
            push_fn: None,
        }
    }
}
impl DirectDisplayBuilder {
    /// The number of lines the display supports.
    pub fn lines(mut self, height: usize) -> Self {
        self.height = height;
        self
    }

    /// The number of characters per line.
    pub fn line_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// The function that sends the line buffer to the hardware. Without one,
    /// pushes are dropped.
    pub fn push_with(
        mut self,
        push_fn: impl FnMut(&[String]) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.push_fn = Some(Box::new(push_fn));
        self
    }

    #[allow(missing_docs)]
    pub fn build(self) -> DirectDisplay {
        DirectDisplay {
            lines: vec![" ".repeat(self.width); self.height],
            width: self.width,
            push_fn: self.push_fn,
        }
    }
}

/// A rectangular view onto part of another display. Writes go through to
/// the underlying display; so do pushes.
///
/// Windows isolate a region so that per-region behavior (like scrolling one
/// line) can't disturb its neighbors.
pub struct DisplayWindow {
    target: Rc<RefCell<dyn Display>>,
    line_range: (usize, usize),
    char_range: (usize, usize),
}
impl DisplayWindow {
    /// A builder for a window onto `target`. Unconstrained ranges default to
    /// the whole display.
    pub fn builder(target: Rc<RefCell<dyn Display>>) -> DisplayWindowBuilder {
        DisplayWindowBuilder {
            target,
            line_range: None,
            char_range: None,
        }
    }
}
impl Display for DisplayWindow {
    fn width(&self) -> usize {
        self.char_range.1 - self.char_range.0
    }

    fn height(&self) -> usize {
        self.line_range.1 - self.line_range.0
    }

    fn line(&self, index: usize) -> String {
        let full = self.target.borrow().line(self.line_range.0 + index);
        full.chars()
            .skip(self.char_range.0)
            .take(self.width())
            .collect()
    }

    fn set_line(&mut self, index: usize, text: &str) {
        let target_index = self.line_range.0 + index;
        let full = self.target.borrow().line(target_index);
        let mut characters: Vec<char> = full.chars().collect();
        for (offset, character) in fix_width(text, self.width()).chars().enumerate() {
            characters[self.char_range.0 + offset] = character;
        }
        let replacement: String = characters.into_iter().collect();
        self.target.borrow_mut().set_line(target_index, &replacement);
    }

    fn push(&mut self) -> anyhow::Result<()> {
        self.target.borrow_mut().push()
    }
}

/// Assembles a [DisplayWindow].
pub struct DisplayWindowBuilder {
    target: Rc<RefCell<dyn Display>>,
    line_range: Option<(usize, usize)>,
    char_range: Option<(usize, usize)>,
}
impl DisplayWindowBuilder {
    /// The lines to include: `start` up to but not including `end`.
    pub fn line_range(mut self, start: usize, end: usize) -> Self {
        self.line_range = Some((start, end));
        self
    }

    /// The columns to include: `start` up to but not including `end`.
    pub fn char_range(mut self, start: usize, end: usize) -> Self {
        self.char_range = Some((start, end));
        self
    }

    /// Builds the window. Panics if a range reaches outside the target;
    /// that's a configuration mistake.
    pub fn build(self) -> DisplayWindow {
        let (target_height, target_width) = {
            let target = self.target.borrow();
            (target.height(), target.width())
        };
        let line_range = self.line_range.unwrap_or((0, target_height));
        let char_range = self.char_range.unwrap_or((0, target_width));
        assert!(
            line_range.0 <= line_range.1 && line_range.1 <= target_height,
            "window line range must fit the target display"
        );
        assert!(
            char_range.0 <= char_range.1 && char_range.1 <= target_width,
            "window char range must fit the target display"
        );
        DisplayWindow {
            target: self.target,
            line_range,
            char_range,
        }
    }
}

struct ScrollState {
    lines: Vec<String>,
    offsets: Vec<usize>,
    scrolling: FxHashSet<usize>,
}

struct ScrollShared {
    target: Rc<RefCell<dyn Display>>,
    scheduler: Rc<Scheduler>,
    interval_ms: u64,
    scroll_amount: usize,
    padding: usize,
    state: RefCell<ScrollState>,
}

/// Turns each line of a display into a marquee when its text is longer than
/// the display is wide.
///
/// Short lines render as-is. A long line starts a self-rescheduling scroll
/// task that rotates it through the underlying display, with a configurable
/// run of spaces between the tail and the wrapped-around head. Re-assigning
/// a line resets its scroll position; if the new text fits, the scroll task
/// retires on its next step.
pub struct ScrollingDisplay {
    shared: Rc<ScrollShared>,
}
impl ScrollingDisplay {
    #[allow(missing_docs)]
    pub const DEFAULT_INTERVAL_MS: u64 = 250;

    #[allow(missing_docs)]
    pub fn new(target: Rc<RefCell<dyn Display>>, scheduler: Rc<Scheduler>) -> Self {
        Self::new_with(target, scheduler, Self::DEFAULT_INTERVAL_MS, 1, 2)
    }

    #[allow(missing_docs)]
    pub fn new_with(
        target: Rc<RefCell<dyn Display>>,
        scheduler: Rc<Scheduler>,
        interval_ms: u64,
        scroll_amount: usize,
        padding: usize,
    ) -> Self {
        let height = target.borrow().height();
        Self {
            shared: Rc::new(ScrollShared {
                target,
                scheduler,
                interval_ms,
                scroll_amount,
                padding,
                state: RefCell::new(ScrollState {
                    lines: vec![String::default(); height],
                    offsets: vec![0; height],
                    scrolling: FxHashSet::default(),
                }),
            }),
        }
    }
}
impl Display for ScrollingDisplay {
    fn width(&self) -> usize {
        self.shared.target.borrow().width()
    }

    fn height(&self) -> usize {
        self.shared.target.borrow().height()
    }

    /// The logical (unscrolled) contents of the line.
    fn line(&self, index: usize) -> String {
        self.shared.state.borrow().lines[index].clone()
    }

    fn set_line(&mut self, index: usize, text: &str) {
        let already_scrolling = {
            let mut state = self.shared.state.borrow_mut();
            state.offsets[index] = 0;
            state.lines[index] = text.to_string();
            state.scrolling.contains(&index)
        };
        // An in-flight scroll task will pick up the new text on its next
        // step; otherwise render (and maybe start scrolling) now.
        if !already_scrolling {
            scroll_step(&self.shared, index);
        }
    }

    fn push(&mut self) -> anyhow::Result<()> {
        self.shared.target.borrow_mut().push()
    }
}

fn scroll_step(shared: &Rc<ScrollShared>, index: usize) {
    let width = shared.target.borrow().width();
    let rendered = {
        let mut state = shared.state.borrow_mut();
        let line = state.lines[index].clone();
        if line.chars().count() <= width {
            // Text fits; the marquee for this line retires.
            state.scrolling.remove(&index);
            line
        } else {
            let padded: Vec<char> = line
                .chars()
                .chain(std::iter::repeat(' ').take(shared.padding))
                .collect();
            let offset = state.offsets[index];
            let wrapped: String = padded[offset..]
                .iter()
                .chain(padded.iter().take(width.saturating_sub(padded.len() - offset)))
                .collect();
            state.offsets[index] = (offset + shared.scroll_amount) % padded.len();
            state.scrolling.insert(index);

            let shared_next = Rc::clone(shared);
            shared.scheduler.schedule(
                move || {
                    scroll_step(&shared_next, index);
                    Ok(())
                },
                shared.interval_ms,
            );
            wrapped
        }
    };
    shared.target.borrow_mut().set_line(index, &rendered);
}

struct PagedState {
    active_page: String,
    temporary_page: Option<String>,
    pages: FxHashMap<String, Vec<String>>,
    reset_task: Option<TaskHandle>,
}

struct PagedShared {
    target: Rc<RefCell<dyn Display>>,
    scheduler: Rc<Scheduler>,
    state: RefCell<PagedState>,
}

/// A display with multiple named pages, one active at a time, plus an
/// optional temporary page that expires back to the active one.
///
/// Setting a temporary page schedules its expiration, replacing any
/// previously pending expiration. Once it expires, the display always
/// reverts to the last non-expiring page.
pub struct PagedDisplay {
    shared: Rc<PagedShared>,
}
impl PagedDisplay {
    #[allow(missing_docs)]
    pub fn new(target: Rc<RefCell<dyn Display>>, scheduler: Rc<Scheduler>) -> Self {
        Self {
            shared: Rc::new(PagedShared {
                target,
                scheduler,
                state: RefCell::new(PagedState {
                    active_page: String::default(),
                    temporary_page: None,
                    pages: FxHashMap::default(),
                    reset_task: None,
                }),
            }),
        }
    }

    /// Writes a line of the named page, creating the page if needed. The
    /// change reaches the underlying display when the page is activated (or
    /// immediately if it's the page being displayed).
    pub fn set_page_line(&self, key: &str, index: usize, text: &str) {
        let width = self.shared.target.borrow().width();
        let displayed = self.displayed_page() == key;
        {
            let mut state = self.shared.state.borrow_mut();
            let page = page_entry(&mut state, key, width, self.shared.target.borrow().height());
            page[index] = fix_width(text, width);
        }
        if displayed {
            self.shared.target.borrow_mut().set_line(index, text);
        }
    }

    /// The contents of the named page, creating it blank if needed.
    pub fn page_lines(&self, key: &str) -> Vec<String> {
        let (width, height) = {
            let target = self.shared.target.borrow();
            (target.width(), target.height())
        };
        let mut state = self.shared.state.borrow_mut();
        page_entry(&mut state, key, width, height).clone()
    }

    /// Every page name seen so far.
    pub fn page_keys(&self) -> Vec<String> {
        self.shared.state.borrow().pages.keys().cloned().collect()
    }

    /// The name of the page currently shown: the temporary page if one is
    /// pending, otherwise the active page.
    pub fn displayed_page(&self) -> String {
        let state = self.shared.state.borrow();
        state
            .temporary_page
            .clone()
            .unwrap_or_else(|| state.active_page.clone())
    }

    /// Makes the named page active and renders it.
    ///
    /// With a nonzero `expiration_ms`, the page is temporary instead: it
    /// shows now and the display reverts to the active page after the
    /// expiration, canceling any previously pending reversion.
    ///
    /// Activating the already-active page again is a no-op.
    pub fn set_active_page(&self, key: &str, expiration_ms: u64, push: bool) -> anyhow::Result<()> {
        {
            let state = self.shared.state.borrow();
            if expiration_ms == 0 && state.active_page == key && state.temporary_page.is_none() {
                return Ok(());
            }
        }
        {
            let mut state = self.shared.state.borrow_mut();
            if expiration_ms == 0 {
                state.active_page = key.to_string();
            } else {
                state.temporary_page = Some(key.to_string());
                if let Some(task) = state.reset_task.take() {
                    self.shared.scheduler.cancel(task);
                }
                let shared = Rc::clone(&self.shared);
                state.reset_task = Some(self.shared.scheduler.schedule(
                    move || reset_to_active(&shared, true),
                    expiration_ms,
                ));
            }
        }
        self.render_page(key)?;
        if push {
            self.shared.target.borrow_mut().push()?;
        }
        Ok(())
    }

    /// Expires any temporary page immediately and re-renders the active
    /// page.
    pub fn reset(&self, push: bool) -> anyhow::Result<()> {
        let task = self.shared.state.borrow_mut().reset_task.take();
        if let Some(task) = task {
            self.shared.scheduler.cancel(task);
        }
        reset_to_active(&self.shared, push)
    }

    fn render_page(&self, key: &str) -> anyhow::Result<()> {
        let lines = self.page_lines(key);
        let mut target = self.shared.target.borrow_mut();
        for (index, line) in lines.iter().enumerate() {
            target.set_line(index, line);
        }
        Ok(())
    }
}
impl Display for PagedDisplay {
    fn width(&self) -> usize {
        self.shared.target.borrow().width()
    }

    fn height(&self) -> usize {
        self.shared.target.borrow().height()
    }

    fn line(&self, index: usize) -> String {
        self.page_lines(&self.displayed_page())[index].clone()
    }

    fn set_line(&mut self, index: usize, text: &str) {
        self.set_page_line(&self.displayed_page(), index, text);
    }

    fn push(&mut self) -> anyhow::Result<()> {
        self.shared.target.borrow_mut().push()
    }
}

fn page_entry<'a>(
    state: &'a mut PagedState,
    key: &str,
    width: usize,
    height: usize,
) -> &'a mut Vec<String> {
    state
        .pages
        .entry(key.to_string())
        .or_insert_with(|| vec![" ".repeat(width); height])
}

fn reset_to_active(shared: &Rc<PagedShared>, push: bool) -> anyhow::Result<()> {
    let lines = {
        let mut state = shared.state.borrow_mut();
        state.temporary_page = None;
        state.reset_task = None;
        let active = state.active_page.clone();
        let width = shared.target.borrow().width();
        let height = shared.target.borrow().height();
        page_entry(&mut state, &active, width, height).clone()
    };
    {
        let mut target = shared.target.borrow_mut();
        for (index, line) in lines.iter().enumerate() {
            target.set_line(index, line);
        }
        if push {
            target.push()?;
        }
    }
    Ok(())
}
