use std::sync::Arc;

use log::{debug, info};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use spindle_core::error::Result;
use spindle_core::task::HandlerId;
use spindle_downloader::{Downloader, HttpConfig, HttpDownloader};
use spindle_queue::TaskQueue;

pub mod config;
pub mod handler;
pub mod stats;
mod worker;

pub use config::EngineConfig;
pub use handler::{
    ErrorCallback, Handler, HandlerRef, HtmlCallback, RequestCallback, ResponseCallback,
};
pub use stats::{CrawlStats, StatsSnapshot};

use crate::handler::HandlerRegistry;
use crate::worker::{run_worker, WorkerContext};

/// Wires handlers into an engine.
///
/// Registering a handler yields the [`HandlerRef`] used to submit tasks
/// for it. That is the only submission path, so a handler that was never
/// registered cannot have tasks queued against it.
pub struct EngineBuilder {
    config: EngineConfig,
    handlers: Vec<Handler>,
    queue: Arc<TaskQueue>,
    stats: Arc<CrawlStats>,
    downloader: Option<Arc<dyn Downloader>>,
}

impl EngineBuilder {
    fn new(config: EngineConfig) -> Self {
        let queue = Arc::new(TaskQueue::with_capacity(config.queue_capacity));
        Self {
            config,
            handlers: Vec::new(),
            queue,
            stats: Arc::new(CrawlStats::default()),
            downloader: None,
        }
    }

    /// Register a handler, assigning the next identifier, and return the
    /// submission capability for it.
    ///
    /// Identifiers are sequential registry positions; registration order
    /// is the only thing that determines them.
    pub fn register(&mut self, handler: Handler) -> HandlerRef {
        let id = HandlerId::new(self.handlers.len());
        let priority = handler.priority();
        debug!("registered handler {:?} as {}", handler.name(), id);
        self.handlers.push(handler);
        HandlerRef::new(id, priority, Arc::clone(&self.queue), Arc::clone(&self.stats))
    }

    /// Use a custom transport instead of the stock HTTP client
    pub fn with_downloader(&mut self, downloader: Arc<dyn Downloader>) -> &mut Self {
        self.downloader = Some(downloader);
        self
    }

    /// Finish wiring and produce the engine.
    ///
    /// Builds the stock HTTP client unless a transport was supplied,
    /// which is the only way this can fail.
    pub fn build(self) -> Result<Engine> {
        let downloader = match self.downloader {
            Some(downloader) => downloader,
            None => Arc::new(HttpDownloader::new(HttpConfig::default())?),
        };

        let registry = HandlerRegistry::new(self.handlers);
        info!("engine built with {} handlers", registry.len());

        Ok(Engine {
            config: self.config,
            queue: self.queue,
            registry: Arc::new(registry),
            stats: self.stats,
            downloader,
            token: CancellationToken::new(),
            workers: Vec::new(),
        })
    }
}

/// The crawl engine.
///
/// Owns the queue, the registered handlers, and the workers that drain
/// the queue through the fetch, parse, dispatch pipeline. The intended
/// lifecycle is [`run`](Engine::run), then [`shutdown`](Engine::shutdown)
/// once, then [`wait`](Engine::wait).
pub struct Engine {
    /// Construction-time settings
    config: EngineConfig,

    /// Pending tasks, shared with every HandlerRef
    queue: Arc<TaskQueue>,

    /// Registered handlers, frozen at build time
    registry: Arc<HandlerRegistry>,

    /// Counters shared with workers and submission paths
    stats: Arc<CrawlStats>,

    /// The transport workers fetch through
    downloader: Arc<dyn Downloader>,

    /// Cooperative cancellation signal for the workers
    token: CancellationToken,

    /// Join handles of the spawned workers
    workers: Vec<JoinHandle<()>>,
}

impl Engine {
    /// Start wiring an engine
    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    /// Counters describing the crawl so far
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of tasks currently queued. A snapshot; it can be stale as
    /// soon as it is returned.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Tasks submitted but not yet finished, queued or in flight.
    /// Reaches zero exactly when the crawl has nothing left to do.
    pub fn pending(&self) -> usize {
        self.stats.pending()
    }

    /// Spawn the configured number of workers and return immediately.
    ///
    /// The crawl proceeds in the background; must be called from within
    /// a Tokio runtime.
    pub fn run(&mut self) {
        info!("starting {} workers", self.config.workers);

        let ctx = Arc::new(WorkerContext {
            queue: Arc::clone(&self.queue),
            registry: Arc::clone(&self.registry),
            downloader: Arc::clone(&self.downloader),
            stats: Arc::clone(&self.stats),
            delay: self.config.delay,
            randomize_user_agent: self.config.randomize_user_agent,
            token: self.token.clone(),
        });

        for worker_id in 0..self.config.workers {
            self.workers
                .push(tokio::spawn(run_worker(worker_id, Arc::clone(&ctx))));
        }
    }

    /// Signal cancellation.
    ///
    /// Workers finish the task they have in hand, if any, and exit; tasks
    /// still queued stay where they are. Call once per run.
    pub fn shutdown(&self) {
        info!("shutdown requested");
        self.token.cancel();
    }

    /// Wait until every worker has exited.
    ///
    /// Call after [`shutdown`](Engine::shutdown): without cancellation
    /// this waits indefinitely while workers sit idle. A worker that
    /// panicked has hit an internal invariant violation, and the panic
    /// resumes here.
    pub async fn wait(&mut self) {
        for handle in self.workers.drain(..) {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
            }
        }
        info!("all workers stopped");
    }
}

#[cfg(test)]
pub(crate) mod mock;
