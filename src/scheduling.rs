// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! The cooperative task queue that every time-deferred behavior in the
//! runtime is built on.

use crate::clock::Clock;
use rustc_hash::FxHashSet;
use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::binary_heap::PeekMut;
use std::collections::BinaryHeap;
use std::rc::Rc;

/// A deferred unit of work. Handing a task to [Scheduler::schedule] transfers
/// ownership; the scheduler runs it at most once.
pub type Task = Box<dyn FnOnce() -> anyhow::Result<()>>;

/// Identifies a scheduled task so that it can be canceled before it runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

struct Entry {
    due_ms: u64,
    seq: u64,
    task: Task,
}
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}
impl Eq for Entry {}
impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.due_ms, self.seq).cmp(&(other.due_ms, other.seq))
    }
}

#[derive(Default)]
struct SchedulerInner {
    queue: BinaryHeap<Reverse<Entry>>,
    // Sequence ids of entries that have been neither executed nor canceled.
    // Canceling removes the id; the heap entry stays behind as a tombstone
    // that idle() skips.
    live: FxHashSet<u64>,
    next_seq: u64,
}

/// A single-threaded, time-ordered queue of deferred tasks.
///
/// The scheduler never runs work on its own. The host's idle tick drives
/// [Scheduler::idle], which drains every task whose due time has passed.
/// Granularity is therefore bounded by how often the host polls.
///
/// Tasks with the same due time run in the order they were scheduled; a
/// strictly increasing sequence counter breaks ties.
pub struct Scheduler {
    clock: Rc<dyn Clock>,
    inner: RefCell<SchedulerInner>,
}
impl Scheduler {
    #[allow(missing_docs)]
    pub fn new_with(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: RefCell::new(SchedulerInner::default()),
        }
    }

    /// The scheduler's current time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Schedules a task to run `delay_ms` from now. A zero delay runs the
    /// task on the next idle tick. Returns a handle usable with
    /// [Scheduler::cancel].
    ///
    /// A running task may call this to schedule more work, including a task
    /// that is due immediately.
    pub fn schedule(
        &self,
        task: impl FnOnce() -> anyhow::Result<()> + 'static,
        delay_ms: u64,
    ) -> TaskHandle {
        let mut inner = self.inner.borrow_mut();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.queue.push(Reverse(Entry {
            due_ms: self.clock.now_ms() + delay_ms,
            seq,
            task: Box::new(task),
        }));
        inner.live.insert(seq);
        TaskHandle(seq)
    }

    /// Tries to cancel a scheduled task. Returns true iff the task was still
    /// pending and is now guaranteed not to run. Canceling a task that has
    /// already executed (or was already canceled) returns false and has no
    /// effect.
    pub fn cancel(&self, handle: TaskHandle) -> bool {
        self.inner.borrow_mut().live.remove(&handle.0)
    }

    /// The number of tasks still waiting to run.
    pub fn pending(&self) -> usize {
        self.inner.borrow().live.len()
    }

    /// Runs every task whose due time is at or before now. The host calls
    /// this once per idle tick.
    ///
    /// The time reference is sampled once per call, so a task scheduled by a
    /// running task is eligible in the same tick only if its due time does
    /// not exceed that sample. A failing task has already been removed from
    /// the queue when its error is returned, so the next idle tick resumes
    /// draining behind it.
    pub fn idle(&self) -> anyhow::Result<()> {
        let now = self.clock.now_ms();
        loop {
            let task = {
                let mut guard = self.inner.borrow_mut();
                let inner = &mut *guard;
                let Some(top) = inner.queue.peek_mut() else {
                    break;
                };
                if top.0.due_ms > now {
                    break;
                }
                let Reverse(entry) = PeekMut::pop(top);
                if inner.live.remove(&entry.seq) {
                    Some(entry.task)
                } else {
                    // Tombstone left behind by cancel().
                    None
                }
            };
            if let Some(task) = task {
                task()?;
            }
        }
        Ok(())
    }
}
