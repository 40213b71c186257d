use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap};
use std::time::Duration;

/// Identifier of an armed task, usable for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Work the scheduler can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// One integrator frame followed by a render.
    Frame,
    /// One ground-return tick.
    GroundReturn,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    due: Duration,
    id: TaskId,
    task: Task,
}

// Ordered by due time, then by arming order (ids are handed out monotonically).
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due.cmp(&other.due).then(self.id.cmp(&other.id))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entry {}

/// Single-threaded cooperative task queue on a virtual clock.
///
/// Tasks run one at a time in due order; tasks due at the same instant run
/// in the order they were armed. Nothing blocks: callers advance the clock
/// explicitly with [`Scheduler::pop_due`].
#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    queue: BinaryHeap<Reverse<Entry>>,
    cancelled: BTreeSet<TaskId>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time of the task that ran last.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Arm `task` to run `delay` after the current time.
    pub fn schedule(&mut self, delay: Duration, task: Task) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.queue.push(Reverse(Entry {
            due: self.now + delay,
            id,
            task,
        }));
        id
    }

    /// Cancel an armed task. Returns `false` if it already ran or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let armed = self.queue.iter().any(|Reverse(e)| e.id == id);
        armed && self.cancelled.insert(id)
    }

    /// Pop the next task due at or before `until`, moving the clock to its due time.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TaskId, Task)> {
        while let Some(Reverse(entry)) = self.queue.peek().copied() {
            if entry.due > until {
                return None;
            }
            self.queue.pop();
            if self.cancelled.remove(&entry.id) {
                continue;
            }
            self.now = self.now.max(entry.due);
            return Some((entry.id, entry.task));
        }
        None
    }

    /// Move the clock forward without running anything.
    pub fn advance_clock(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Armed tasks that have not been cancelled.
    pub fn pending(&self) -> usize {
        self.queue.len() - self.cancelled.len()
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        !self.cancelled.contains(&id) && self.queue.iter().any(|Reverse(e)| e.id == id)
    }
}
