//! Cancellable delayed tasks on a cooperative, single-threaded queue.
//!
//! The host drives the queue by calling `DelayQueue::due(now)` from its event
//! loop; nothing runs behind its back. A task cancelled before it comes due is
//! never returned, and cancelling a task that already ran is a no-op.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskState {
    Pending,
    Cancelled,
    Fired,
}

/// Owned handle to one scheduled task.
#[derive(Debug)]
pub struct TaskHandle {
    state: Rc<Cell<TaskState>>,
}

impl TaskHandle {
    /// Prevent the task from running. Idempotent.
    pub fn cancel(&self) {
        if self.state.get() == TaskState::Pending {
            self.state.set(TaskState::Cancelled);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state.get() == TaskState::Pending
    }

    pub fn has_fired(&self) -> bool {
        self.state.get() == TaskState::Fired
    }
}

#[derive(Debug)]
struct Entry<T> {
    deadline: Instant,
    state: Rc<Cell<TaskState>>,
    payload: T,
}

/// Queue of delayed payloads, released in deadline order.
#[derive(Debug)]
pub struct DelayQueue<T> {
    entries: Vec<Entry<T>>,
}

impl<T> Default for DelayQueue<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> DelayQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` to come due `delay` after `now`.
    ///
    /// Earlier tasks are left alone; callers cancel them explicitly.
    pub fn schedule(&mut self, now: Instant, delay: Duration, payload: T) -> TaskHandle {
        let state = Rc::new(Cell::new(TaskState::Pending));
        self.entries.push(Entry {
            deadline: now + delay,
            state: Rc::clone(&state),
            payload,
        });
        TaskHandle { state }
    }

    /// Remove and return every live payload whose deadline has passed.
    /// Cancelled entries are discarded without being returned.
    pub fn due(&mut self, now: Instant) -> Vec<T> {
        self.entries
            .retain(|entry| entry.state.get() == TaskState::Pending);
        let (mut ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| entry.deadline <= now);
        self.entries = waiting;
        ready.sort_by_key(|entry| entry.deadline);
        ready
            .into_iter()
            .map(|entry| {
                entry.state.set(TaskState::Fired);
                entry.payload
            })
            .collect()
    }

    /// Number of tasks that are still waiting to run.
    pub fn pending(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.state.get() == TaskState::Pending)
            .count()
    }

    /// Earliest deadline among live tasks, for hosts that arm a timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries
            .iter()
            .filter(|entry| entry.state.get() == TaskState::Pending)
            .map(|entry| entry.deadline)
            .min()
    }

    /// Cancel everything.
    pub fn cancel_all(&mut self) {
        for entry in self.entries.drain(..) {
            if entry.state.get() == TaskState::Pending {
                entry.state.set(TaskState::Cancelled);
            }
        }
    }
}
