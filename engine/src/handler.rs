//! Handlers, their callback chains, and the capability to submit tasks.

use std::sync::Arc;

use log::debug;

use spindle_core::error::{Error, Result};
use spindle_core::request::Request;
use spindle_core::response::Response;
use spindle_core::task::{HandlerId, Task};
use spindle_html::Document;
use spindle_queue::TaskQueue;

use crate::stats::CrawlStats;

/// Callback run before a task's request is dispatched. May mutate the request.
pub type RequestCallback = Box<dyn Fn(&mut Request) + Send + Sync + 'static>;

/// Callback run with the raw response after a successful fetch
pub type ResponseCallback = Box<dyn Fn(&Response) + Send + Sync + 'static>;

/// Callback run with the parsed document. The primary extension point:
/// it may submit further tasks through any [`HandlerRef`] it has captured.
pub type HtmlCallback = Box<dyn Fn(&Request, &Response, &Document) + Send + Sync + 'static>;

/// Callback run when a fetch or a parse fails. The response is present
/// when one was received before the failure (so always for parse errors,
/// never for fetch errors).
pub type ErrorCallback = Box<dyn Fn(Option<&Response>, &Error) + Send + Sync + 'static>;

/// One named processing pipeline.
///
/// Callbacks are appended while the handler is being set up. Registering
/// the handler with an [`EngineBuilder`](crate::EngineBuilder) moves it
/// into the registry, so the chains are frozen from then on and workers
/// read them without locking. Within each chain, callbacks run in the
/// order they were added.
pub struct Handler {
    name: String,
    priority: i32,
    on_request: Vec<RequestCallback>,
    on_response: Vec<ResponseCallback>,
    on_html: Vec<HtmlCallback>,
    on_error: Vec<ErrorCallback>,
}

impl Handler {
    /// Create a handler with default priority 0
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            on_request: Vec::new(),
            on_response: Vec::new(),
            on_html: Vec::new(),
            on_error: Vec::new(),
        }
    }

    /// Set the default priority for tasks submitted through this handler.
    /// Lower values are served first.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// The handler's name, used in logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The default priority for tasks submitted through this handler
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Append a pre-fetch callback
    pub fn on_request<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut Request) + Send + Sync + 'static,
    {
        self.on_request.push(Box::new(callback));
        self
    }

    /// Append a post-fetch callback
    pub fn on_response<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Response) + Send + Sync + 'static,
    {
        self.on_response.push(Box::new(callback));
        self
    }

    /// Append a post-parse callback
    pub fn on_html<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Request, &Response, &Document) + Send + Sync + 'static,
    {
        self.on_html.push(Box::new(callback));
        self
    }

    /// Append an error callback
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(Option<&Response>, &Error) + Send + Sync + 'static,
    {
        self.on_error.push(Box::new(callback));
        self
    }

    pub(crate) fn dispatch_request(&self, request: &mut Request) {
        for callback in &self.on_request {
            callback(request);
        }
    }

    pub(crate) fn dispatch_response(&self, response: &Response) {
        for callback in &self.on_response {
            callback(response);
        }
    }

    pub(crate) fn dispatch_html(&self, request: &Request, response: &Response, document: &Document) {
        for callback in &self.on_html {
            callback(request, response, document);
        }
    }

    pub(crate) fn dispatch_error(&self, response: Option<&Response>, error: &Error) {
        for callback in &self.on_error {
            callback(response, error);
        }
    }
}

/// Position-indexed collection of registered handlers, read-only once built.
pub(crate) struct HandlerRegistry {
    handlers: Vec<Handler>,
}

impl HandlerRegistry {
    pub(crate) fn new(handlers: Vec<Handler>) -> Self {
        Self { handlers }
    }

    /// Look up the handler a task is bound to.
    ///
    /// Identifiers are produced only by registration, so an unknown one
    /// means the engine's own bookkeeping is corrupt. That is a bug, not
    /// a runtime condition, and it panics.
    pub(crate) fn resolve(&self, id: HandlerId) -> &Handler {
        match self.handlers.get(id.index()) {
            Some(handler) => handler,
            None => panic!(
                "task routed to unknown handler {} ({} registered)",
                id,
                self.handlers.len()
            ),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.len()
    }
}

/// The capability to submit tasks through a registered handler.
///
/// Returned by [`EngineBuilder::register`](crate::EngineBuilder::register);
/// there is no other way to put a task on the queue, so every queued task
/// is bound to a handler the registry knows. Clones share the same
/// handler and may be captured by callbacks to submit recursively.
#[derive(Clone)]
pub struct HandlerRef {
    id: HandlerId,
    priority: i32,
    queue: Arc<TaskQueue>,
    stats: Arc<CrawlStats>,
}

impl HandlerRef {
    pub(crate) fn new(
        id: HandlerId,
        priority: i32,
        queue: Arc<TaskQueue>,
        stats: Arc<CrawlStats>,
    ) -> Self {
        Self {
            id,
            priority,
            queue,
            stats,
        }
    }

    /// The identifier assigned at registration
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Submit a GET for `url` at the handler's default priority.
    ///
    /// A malformed URL is reported here, before anything is queued.
    pub fn submit<U: AsRef<str>>(&self, url: U) -> Result<()> {
        let request = Request::get(url)?;
        self.submit_request(request);
        Ok(())
    }

    /// Submit a GET for `url` at an explicit priority
    pub fn submit_with_priority<U: AsRef<str>>(&self, url: U, priority: i32) -> Result<()> {
        let request = Request::get(url)?;
        self.submit_request_with_priority(request, priority);
        Ok(())
    }

    /// Submit a prepared request at the handler's default priority
    pub fn submit_request(&self, request: Request) {
        self.submit_request_with_priority(request, self.priority);
    }

    /// Submit a prepared request at an explicit priority
    pub fn submit_request_with_priority(&self, request: Request, priority: i32) {
        debug!(
            "submitting {} to handler {} at priority {}",
            request.url, self.id, priority
        );
        self.stats.record_submitted();
        self.queue.push(Task::new(self.id, request, priority));
    }
}
