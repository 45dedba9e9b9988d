pub mod error;
pub mod request;
pub mod response;
pub mod task;

pub use error::{Error, Result};
pub use request::{Method, Request};
pub use response::Response;
pub use task::{HandlerId, Task};

/// Re-export commonly used crates
pub use async_trait::async_trait;
pub use serde;
pub use serde_json;
pub use url;
