// Configuration for the crawler engine

use std::time::Duration;

/// Construction-time knobs for an [`Engine`](crate::Engine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of workers draining the queue
    pub workers: usize,

    /// Pause after each processed task, a coarse rate limit.
    /// Idle workers do not poll on this; they park until a push arrives.
    pub delay: Duration,

    /// Queue capacity reserved up front
    pub queue_capacity: usize,

    /// Replace the User-Agent header with a random browser string
    /// before each dispatch
    pub randomize_user_agent: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            delay: Duration::from_secs(1),
            queue_capacity: 100,
            randomize_user_agent: true,
        }
    }
}

impl EngineConfig {
    /// Set the number of workers
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the pause applied after each processed task
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the queue capacity reserved up front
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Enable or disable User-Agent randomization
    pub fn with_randomize_user_agent(mut self, enabled: bool) -> Self {
        self.randomize_user_agent = enabled;
        self
    }
}
