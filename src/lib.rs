//! # Spindle
//!
//! Spindle is a priority-scheduled concurrent web crawler written in Rust.
//! Tasks are drained from a shared min-priority queue by a fixed pool of
//! async workers, each running the same pipeline: fetch the page, parse
//! it, and hand the results to the callbacks of the handler the task was
//! submitted through.
//!
//! ## Components
//!
//! - **Core**: requests, responses, tasks, and the error type.
//! - **Queue**: the thread-safe priority queue workers drain.
//! - **Downloader**: the HTTP client behind the [`Downloader`](prelude::Downloader) trait.
//! - **Html**: CSS-selector access to fetched documents.
//! - **Engine**: handler registration, the worker pool, and the crawl lifecycle.
//!
//! ## Example
//!
//! ```rust,no_run
//! use spindle::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     env_logger::init();
//!
//!     let handler = Handler::new("pages").on_html(|_, response, document| {
//!         println!("fetched {} ({} links)", response.url, document.links().len());
//!     });
//!
//!     let mut builder = Engine::builder(EngineConfig::default());
//!     let pages = builder.register(handler);
//!     pages.submit("https://example.com")?;
//!
//!     let mut engine = builder.build()?;
//!     engine.run();
//!
//!     while engine.pending() > 0 {
//!         tokio::time::sleep(Duration::from_millis(100)).await;
//!     }
//!
//!     engine.shutdown();
//!     engine.wait().await;
//!
//!     println!("{:?}", engine.stats());
//!     Ok(())
//! }
//! ```

pub use spindle_core as core;
pub use spindle_downloader as downloader;
pub use spindle_engine as engine;
pub use spindle_html as html;
pub use spindle_queue as queue;

/// Prelude module that re-exports commonly used types
pub mod prelude {
    pub use spindle_core::error::{Error, Result};
    pub use spindle_core::request::{Method, Request};
    pub use spindle_core::response::Response;
    pub use spindle_core::task::{HandlerId, Task};
    pub use spindle_downloader::{Downloader, HttpConfig, HttpDownloader};
    pub use spindle_engine::{
        CrawlStats, Engine, EngineBuilder, EngineConfig, Handler, HandlerRef, StatsSnapshot,
    };
    pub use spindle_html::{Document, Element};
    pub use spindle_queue::TaskQueue;
}
