// ABOUTME: ExtractionResult and ContentEntry: the uniform output of the pipeline.
// ABOUTME: Constructors keep entries and the method label consistent; includes display helpers.

use std::fmt;

use serde::Serialize;

use crate::error::SiftError;

/// Failure label when a page produced no entries at all.
pub const NO_CONTENT: &str = "No content could be parsed from the page";

/// One piece of extracted content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentEntry {
    /// Paragraph or heading text, trimmed and longer than the minimum length.
    Text { text: String },
    /// A link with its visible label and absolute target.
    Link { label: String, url: String },
}

impl ContentEntry {
    pub fn text(text: impl Into<String>) -> Self {
        ContentEntry::Text { text: text.into() }
    }

    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        ContentEntry::Link {
            label: label.into(),
            url: url.into(),
        }
    }
}

impl fmt::Display for ContentEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentEntry::Text { text } => write!(f, "{}", text),
            ContentEntry::Link { label, url } => write!(f, "Link: {} - {}", label, url),
        }
    }
}

/// Which strategy produced a result, or why none did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum Method {
    Static,
    Rendered,
    Failed(String),
}

impl Method {
    pub fn label(&self) -> &str {
        match self {
            Method::Static => "static",
            Method::Rendered => "rendered",
            Method::Failed(reason) => reason.as_str(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Method::Failed(_))
    }
}

impl From<Method> for String {
    fn from(m: Method) -> Self {
        m.label().to_string()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Entries extracted from one page plus the method label.
///
/// Non-empty entries always come with `Static` or `Rendered`; empty entries
/// always come with a failure reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    entries: Vec<ContentEntry>,
    method: Method,
}

impl ExtractionResult {
    /// Wrap extracted entries. An empty list becomes a failure labelled `empty_reason`.
    pub fn with_entries(
        entries: Vec<ContentEntry>,
        method: Method,
        empty_reason: impl Into<String>,
    ) -> Self {
        if entries.is_empty() || method.is_failure() {
            let reason = match method {
                Method::Failed(reason) => reason,
                _ => empty_reason.into(),
            };
            return Self::failure(reason);
        }
        Self { entries, method }
    }

    /// An empty result carrying a failure reason.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            method: Method::Failed(reason.into()),
        }
    }

    /// An empty result labelled with the error's message.
    pub fn from_error(err: &SiftError) -> Self {
        Self::failure(err.to_string())
    }

    pub fn entries(&self) -> &[ContentEntry] {
        &self.entries
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn is_success(&self) -> bool {
        !self.method.is_failure()
    }

    /// The failure reason, if this result is a failure.
    pub fn failure_reason(&self) -> Option<&str> {
        match &self.method {
            Method::Failed(reason) => Some(reason.as_str()),
            _ => None,
        }
    }

    pub fn into_parts(self) -> (Vec<ContentEntry>, Method) {
        (self.entries, self.method)
    }

    /// Render as a numbered list, one entry per line.
    pub fn format_numbered(&self) -> String {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{}. {}", i + 1, e))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
