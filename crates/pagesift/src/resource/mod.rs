// ABOUTME: Resource fetching with retry/backoff, header rotation, and status classification.
// ABOUTME: Handles content-length limits and charset decoding of fetched documents.

pub mod retry;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use once_cell::sync::OnceCell;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::SiftError;
use crate::identity::{IdentityProvider, RequestIdentity};
use crate::options::Options;
use self::retry::{
    classify_error, classify_status, next_action, next_action_after_insecure, FetchOutcome,
    RetryAction,
};

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Maximum redirects followed per request.
const MAX_REDIRECTS: usize = 10;

/// A document returned by a successful (HTTP 200) fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedDocument {
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchedDocument {
    /// Decode the body as UTF-8 text, using the charset from the content-type header
    /// or falling back to detection.
    pub fn text_utf8(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

fn build_http_client(timeout: Duration, accept_invalid_certs: bool) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(timeout)
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
}

/// Fetches one target with retries. Owns its HTTP session; build one per request.
pub struct Fetcher {
    client: reqwest::Client,
    insecure_client: OnceCell<reqwest::Client>,
    identity: Arc<dyn IdentityProvider>,
    max_retries: u32,
    base_delay: Duration,
    timeout: Duration,
    headers: HashMap<String, String>,
}

impl Fetcher {
    /// Create a fetcher with a fresh cookie-keeping session.
    ///
    /// No target is known yet, so a client build error carries an empty URL;
    /// callers attach one with [`SiftError::with_url`].
    pub fn new(opts: &Options, identity: Arc<dyn IdentityProvider>) -> Result<Self, SiftError> {
        let client = build_http_client(opts.request_timeout, false)
            .map_err(|e| SiftError::fatal("", format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            insecure_client: OnceCell::new(),
            identity,
            max_retries: opts.max_retries.max(1),
            base_delay: opts.base_delay,
            timeout: opts.request_timeout,
            headers: opts.headers.clone(),
        })
    }

    /// Fetch `target`, retrying per the attempt budget.
    ///
    /// Every attempt sleeps `base_delay` first and draws a new identity.
    /// 403 and unclassified failures abort immediately.
    pub async fn fetch(&self, target: &Url) -> Result<FetchedDocument, SiftError> {
        let url = target.as_str();
        let max = self.max_retries;
        let mut last = String::new();

        for attempt in 1..=max {
            info!(url, attempt, max_retries = max, "fetching");
            tokio::time::sleep(self.base_delay).await;

            let identity = self.identity.identity();
            let mut outcome = self.send(&self.client, target, &identity).await;
            let mut action = next_action(attempt, max, self.base_delay, &outcome);

            if action == RetryAction::RetryInsecure {
                warn!(url, attempt, reason = %outcome.describe(), "TLS error, retrying without certificate verification");
                outcome = match self.insecure_client() {
                    Ok(client) => self.send(client, target, &identity).await,
                    Err(e) => FetchOutcome::FatalError(format!("failed to build HTTP client: {}", e)),
                };
                if !matches!(outcome, FetchOutcome::Success(_)) {
                    error!(url, attempt, reason = %outcome.describe(), "unverified request failed");
                }
                action = next_action_after_insecure(attempt, max, &outcome);
            }

            match (action, outcome) {
                (RetryAction::Succeed, FetchOutcome::Success(doc)) => {
                    info!(url, attempt, bytes = doc.body.len(), "fetched");
                    return Ok(doc);
                }
                (RetryAction::Abort, FetchOutcome::Blocked) => {
                    error!(url, attempt, "access forbidden, site may have anti-bot protection");
                    return Err(SiftError::Blocked {
                        url: url.to_string(),
                    });
                }
                (RetryAction::Abort, other) => {
                    error!(url, attempt, reason = %other.describe(), "unexpected fetch error");
                    return Err(SiftError::fatal(url, other.describe()));
                }
                (RetryAction::RetryAfter(delay), other) => {
                    log_retry(url, attempt, &other, delay);
                    last = other.describe();
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                (RetryAction::Exhausted, other) => {
                    log_retry(url, attempt, &other, Duration::ZERO);
                    last = other.describe();
                }
                (action, other) => {
                    return Err(SiftError::fatal(
                        url,
                        format!("inconsistent retry state {:?} after {}", action, other.describe()),
                    ));
                }
            }
        }

        error!(url, attempts = max, last = %last, "failed to fetch content");
        Err(SiftError::Exhausted {
            url: url.to_string(),
            attempts: max,
            last,
        })
    }

    fn insecure_client(&self) -> reqwest::Result<&reqwest::Client> {
        self.insecure_client
            .get_or_try_init(|| build_http_client(self.timeout, true))
    }

    /// Issue one GET and classify the result.
    async fn send(
        &self,
        client: &reqwest::Client,
        target: &Url,
        identity: &RequestIdentity,
    ) -> FetchOutcome {
        let mut request = client.get(target.clone()).headers(identity.to_headers());
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => return classify_error(&e),
        };

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        if let Some(outcome) = classify_status(status, retry_after.as_deref()) {
            return outcome;
        }

        if let Some(len) = response.content_length() {
            if len as usize > MAX_CONTENT_LENGTH {
                return FetchOutcome::FatalError("content too large".to_string());
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_lowercase());

        let body = match response.bytes().await {
            Ok(b) => b,
            Err(e) => return classify_error(&e),
        };
        if body.len() > MAX_CONTENT_LENGTH {
            return FetchOutcome::FatalError("content too large".to_string());
        }

        FetchOutcome::Success(FetchedDocument {
            final_url,
            content_type,
            body,
        })
    }
}

fn log_retry(url: &str, attempt: u32, outcome: &FetchOutcome, delay: Duration) {
    let delay_ms = delay.as_millis() as u64;
    match outcome {
        FetchOutcome::RateLimited(_) => {
            warn!(url, attempt, delay_ms, "rate limited");
        }
        FetchOutcome::UnexpectedStatus(status) => {
            error!(url, attempt, status, "failed to fetch content");
        }
        other => {
            error!(url, attempt, delay_ms, reason = %other.describe(), "request failed");
        }
    }
    debug!(url, attempt, code = ?outcome.error_code(), "attempt finished");
}
