use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use spindle_core::async_trait;
use spindle_core::error::{Error, Result};
use spindle_core::request::Request;
use spindle_core::response::Response;
use spindle_downloader::Downloader;

/// A downloader serving canned pages, recording every request it sees
pub struct MockDownloader {
    /// Canned status and body per URL
    pages: HashMap<String, (u16, Vec<u8>)>,

    /// URLs whose fetch fails, with the failure message
    failures: HashMap<String, String>,

    /// Delay applied to every fetch, to hold tasks in flight
    delay: Option<Duration>,

    /// Requests delivered so far
    requests: Mutex<Vec<Request>>,
}

impl MockDownloader {
    /// Create a mock with no canned pages; unknown URLs get a stub page
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            failures: HashMap::new(),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Serve `body` with status 200 for `url`
    pub fn add_page(&mut self, url: &str, body: impl Into<Vec<u8>>) {
        self.pages.insert(url.to_string(), (200, body.into()));
    }

    /// Serve an arbitrary status and body for `url`
    pub fn add_response(&mut self, url: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.pages.insert(url.to_string(), (status, body.into()));
    }

    /// Fail fetches of `url` with the given message
    pub fn add_failure(&mut self, url: &str, message: &str) {
        self.failures.insert(url.to_string(), message.to_string());
    }

    /// Delay every fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every request delivered so far, in arrival order
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    async fn download(&self, request: Request) -> Result<Response> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.requests.lock().unwrap().push(request.clone());

        let url = request.url.to_string();
        if let Some(message) = self.failures.get(&url) {
            return Err(Error::fetch(url, message.clone()));
        }

        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "text/html".to_string());

        match self.pages.get(&url) {
            Some((status, body)) => Ok(Response::new(request, *status, headers, body.clone())),
            None => {
                let body =
                    format!("<html><body><h1>Mock page for {}</h1></body></html>", url).into_bytes();
                Ok(Response::new(request, 200, headers, body))
            }
        }
    }
}

/// A downloader that refuses every request
pub struct FailingDownloader;

#[async_trait]
impl Downloader for FailingDownloader {
    async fn download(&self, request: Request) -> Result<Response> {
        Err(Error::fetch(
            request.url.as_str(),
            "refused by test downloader",
        ))
    }
}
