use std::fmt;

use serde::{Deserialize, Serialize};

use crate::request::Request;

/// Identifier assigned to a handler when it is registered with the engine.
///
/// Identifiers are only ever produced by the engine's registry; a task
/// carrying an identifier the registry does not know is an internal
/// consistency violation, not a recoverable condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandlerId(usize);

impl HandlerId {
    /// Create an identifier from a registry position
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// The registry position this identifier refers to
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One pending fetch, bound to the handler that will process it.
///
/// The binding and the priority are fixed at creation. A task is owned by
/// exactly one place at a time: the queue while it waits, then the worker
/// that popped it. It is never requeued.
#[derive(Debug, Clone)]
pub struct Task {
    request: Request,
    priority: i32,
    handler: HandlerId,
}

impl Task {
    /// Create a task bound to the given handler
    pub fn new(handler: HandlerId, request: Request, priority: i32) -> Self {
        Self {
            request,
            priority,
            handler,
        }
    }

    /// The handler this task routes back to
    pub fn handler(&self) -> HandlerId {
        self.handler
    }

    /// Ordering key; lower values are served first
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// The request this task will fetch
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Consume the task, yielding the request for the fetch pipeline
    pub fn into_request(self) -> Request {
        self.request
    }
}
