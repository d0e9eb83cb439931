// ABOUTME: Error types for the pagesift pipeline including the ErrorCode enum and SiftError.
// ABOUTME: Every variant renders as the human-readable failure label handed back to callers.

use std::fmt;
use std::time::Duration;

/// Error codes representing the categories of pipeline failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidUrl,
    Network,
    RateLimited,
    Blocked,
    Tls,
    Fatal,
    Exhausted,
    Parse,
    Render,
    Timeout,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::Network => "network error",
            ErrorCode::RateLimited => "rate limited",
            ErrorCode::Blocked => "blocked",
            ErrorCode::Tls => "TLS error",
            ErrorCode::Fatal => "fatal error",
            ErrorCode::Exhausted => "retries exhausted",
            ErrorCode::Parse => "parse error",
            ErrorCode::Render => "render error",
            ErrorCode::Timeout => "timeout",
        };
        write!(f, "{}", s)
    }
}

/// The error type for fetch and extraction failures.
///
/// The `Display` output of each variant is the failure label surfaced in
/// [`crate::ExtractionResult::method`].
#[derive(Debug, thiserror::Error)]
pub enum SiftError {
    /// The target could not be normalized into an http(s) URL.
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The server answered 403; retrying is pointless.
    #[error("Access forbidden - site may have anti-bot protection")]
    Blocked { url: String },

    /// A failure outside the classified transport errors. Aborts retries.
    #[error("Unexpected error: {reason}")]
    Fatal { url: String, reason: String },

    /// Every fetch attempt failed with a retryable outcome.
    #[error("Failed to fetch content after {attempts} attempts")]
    Exhausted {
        url: String,
        attempts: u32,
        last: String,
    },

    /// The document held nothing worth extracting.
    #[error("{reason}")]
    Parse { reason: String },

    /// The headless browser failed to produce a document.
    #[error("Rendered extraction error: {source}")]
    Render {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    /// The caller's deadline elapsed before the pipeline finished.
    #[error("Timed out after {}s", .deadline.as_secs_f64())]
    Timeout { url: String, deadline: Duration },
}

impl SiftError {
    /// Create an InvalidUrl error.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        SiftError::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a Fatal error.
    pub fn fatal(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        SiftError::Fatal {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a Parse error carrying the given label.
    pub fn parse(reason: impl Into<String>) -> Self {
        SiftError::Parse {
            reason: reason.into(),
        }
    }

    /// Create a Render error.
    pub fn render(url: impl Into<String>, source: anyhow::Error) -> Self {
        SiftError::Render {
            url: url.into(),
            source,
        }
    }

    /// Fill in the target URL when the error was raised before one was known.
    pub fn with_url(mut self, target: &str) -> Self {
        match &mut self {
            SiftError::InvalidUrl { url, .. }
            | SiftError::Blocked { url }
            | SiftError::Fatal { url, .. }
            | SiftError::Exhausted { url, .. }
            | SiftError::Render { url, .. }
            | SiftError::Timeout { url, .. } => {
                if url.is_empty() {
                    *url = target.to_string();
                }
            }
            SiftError::Parse { .. } => {}
        }
        self
    }

    /// The category of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SiftError::InvalidUrl { .. } => ErrorCode::InvalidUrl,
            SiftError::Blocked { .. } => ErrorCode::Blocked,
            SiftError::Fatal { .. } => ErrorCode::Fatal,
            SiftError::Exhausted { .. } => ErrorCode::Exhausted,
            SiftError::Parse { .. } => ErrorCode::Parse,
            SiftError::Render { .. } => ErrorCode::Render,
            SiftError::Timeout { .. } => ErrorCode::Timeout,
        }
    }

    /// Returns true if this is a Blocked error.
    pub fn is_blocked(&self) -> bool {
        self.code() == ErrorCode::Blocked
    }

    /// Returns true if this is an Exhausted error.
    pub fn is_exhausted(&self) -> bool {
        self.code() == ErrorCode::Exhausted
    }

    /// Returns true if this is a Fatal error.
    pub fn is_fatal(&self) -> bool {
        self.code() == ErrorCode::Fatal
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code() == ErrorCode::InvalidUrl
    }

    /// Returns true if this is a Render error.
    pub fn is_render(&self) -> bool {
        self.code() == ErrorCode::Render
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code() == ErrorCode::Timeout
    }
}
