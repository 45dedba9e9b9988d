use thiserror::Error;
use url::ParseError;

/// Errors produced while crawling
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// The URL could not be parsed at submission time
    #[error("invalid URL: {0}")]
    UrlParse(#[from] ParseError),

    /// The transport could not complete the request
    #[error("fetch failed for {url}: {message}")]
    Fetch {
        /// URL the fetch was issued against
        url: String,
        /// Transport-level failure description
        message: String,
    },

    /// The response body could not be turned into a document
    #[error("parse failed for {url}: {message}")]
    Parse {
        /// URL the response came from
        url: String,
        /// What went wrong while parsing
        message: String,
    },

    /// A CSS selector could not be compiled
    #[error("invalid selector {selector:?}: {message}")]
    Selector {
        /// The selector text as given
        selector: String,
        /// Compiler error description
        message: String,
    },

    /// The HTTP client could not be constructed
    #[error("transport setup failed: {0}")]
    Transport(String),
}

impl Error {
    /// Create a new fetch error
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a new selector error
    pub fn selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.into(),
        }
    }

    /// True if the transport failed to complete the request
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }

    /// True if a response arrived but its body could not be parsed
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// The URL this error is about, if it carries one
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Fetch { url, .. } | Self::Parse { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// Result type for Spindle operations
pub type Result<T> = std::result::Result<T, Error>;
