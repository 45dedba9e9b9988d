// Crawl statistics

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// Live counters shared by the submission paths and all workers.
#[derive(Debug, Default)]
pub struct CrawlStats {
    tasks_submitted: AtomicUsize,
    tasks_completed: AtomicUsize,
    pages_fetched: AtomicUsize,
    fetch_errors: AtomicUsize,
    parse_errors: AtomicUsize,
}

impl CrawlStats {
    pub(crate) fn record_submitted(&self) {
        self.tasks_submitted.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_completed(&self) {
        self.tasks_completed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_fetched(&self) {
        self.pages_fetched.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_fetch_error(&self) {
        self.fetch_errors.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::SeqCst);
    }

    /// Tasks submitted but not yet finished, queued or in flight
    pub fn pending(&self) -> usize {
        let submitted = self.tasks_submitted.load(Ordering::SeqCst);
        let completed = self.tasks_completed.load(Ordering::SeqCst);
        submitted.saturating_sub(completed)
    }

    /// A point-in-time copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            tasks_submitted: self.tasks_submitted.load(Ordering::SeqCst),
            tasks_completed: self.tasks_completed.load(Ordering::SeqCst),
            pages_fetched: self.pages_fetched.load(Ordering::SeqCst),
            fetch_errors: self.fetch_errors.load(Ordering::SeqCst),
            parse_errors: self.parse_errors.load(Ordering::SeqCst),
        }
    }
}

/// Counters describing a crawl at one moment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Tasks pushed onto the queue
    pub tasks_submitted: usize,

    /// Tasks whose pipeline ran to the end, successfully or not
    pub tasks_completed: usize,

    /// Fetches that returned a response
    pub pages_fetched: usize,

    /// Fetches the transport could not complete
    pub fetch_errors: usize,

    /// Responses whose body could not be parsed
    pub parse_errors: usize,
}
