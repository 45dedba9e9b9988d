//! Thread-safe priority queue of pending fetch tasks.
//!
//! Workers and submission paths share one [`TaskQueue`]. Pushing never
//! blocks and popping never waits; idle workers park on [`TaskQueue::notified`]
//! until a push arrives instead of polling on a timer.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use spindle_core::task::Task;

/// Heap entry. `BinaryHeap` is a max-heap, so the comparison is reversed
/// to serve the lowest priority value first. Entries with equal priority
/// compare equal; their relative order is arbitrary.
struct QueuedTask(Task);

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.0.priority() == other.0.priority()
    }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.priority().cmp(&self.0.priority())
    }
}

/// A min-priority multiset of pending tasks, safe to share across workers.
///
/// The mutex guards only the heap mutation itself; no fetch or parse work
/// ever runs while it is held. Callbacks running inside a worker may
/// therefore push new tasks freely.
pub struct TaskQueue {
    heap: Mutex<BinaryHeap<QueuedTask>>,
    notify: Notify,
}

impl TaskQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            notify: Notify::new(),
        }
    }

    /// Create an empty queue with room for `capacity` tasks before reallocating
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::with_capacity(capacity)),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BinaryHeap<QueuedTask>> {
        self.heap.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a task. Always succeeds; callable from any thread, including
    /// from within a callback running on a worker.
    pub fn push(&self, task: Task) {
        self.lock().push(QueuedTask(task));
        self.notify.notify_one();
    }

    /// Remove and return the task with the lowest priority value, or `None`
    /// if the queue is empty. Never blocks; an empty queue is a normal
    /// condition, not an error.
    pub fn try_pop(&self) -> Option<Task> {
        let (popped, remaining) = {
            let mut heap = self.lock();
            let popped = heap.pop();
            (popped, heap.len())
        };

        // A wake-up is stored per notify_one call at most once, so pushes
        // that found no parked worker coalesce. Hand the wake-up on while
        // tasks remain so every parked worker eventually gets one.
        if popped.is_some() && remaining > 0 {
            self.notify.notify_one();
        }

        popped.map(|entry| entry.0)
    }

    /// Number of tasks currently queued. Under concurrent mutation the
    /// value may be stale by the time the caller looks at it; treat it as
    /// a liveness hint, never a precondition.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if no tasks are queued right now
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until a push signals that work may be available. Spurious
    /// wake-ups are possible; callers loop back to [`TaskQueue::try_pop`].
    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
