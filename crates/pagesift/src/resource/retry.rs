// ABOUTME: Retry state machine for the fetcher: attempt outcomes and the pure transition function.
// ABOUTME: Also classifies transport errors and parses the Retry-After header.

use std::error::Error as StdError;
use std::time::Duration;

use super::FetchedDocument;
use crate::error::ErrorCode;

/// Outcome of a single fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// HTTP 200 with the raw body.
    Success(FetchedDocument),
    /// HTTP 403.
    Blocked,
    /// HTTP 429, with the server-suggested wait when it sent a usable one.
    RateLimited(Option<Duration>),
    /// Any other HTTP status.
    UnexpectedStatus(u16),
    /// Certificate or TLS handshake failure.
    TlsFailure(String),
    /// Timeouts, refused or reset connections, DNS failures, truncated bodies.
    TransientError(String),
    /// Anything else. Never retried.
    FatalError(String),
}

impl FetchOutcome {
    /// The error category of a failed outcome.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            FetchOutcome::Success(_) => None,
            FetchOutcome::Blocked => Some(ErrorCode::Blocked),
            FetchOutcome::RateLimited(_) => Some(ErrorCode::RateLimited),
            FetchOutcome::UnexpectedStatus(_) | FetchOutcome::TransientError(_) => {
                Some(ErrorCode::Network)
            }
            FetchOutcome::TlsFailure(_) => Some(ErrorCode::Tls),
            FetchOutcome::FatalError(_) => Some(ErrorCode::Fatal),
        }
    }

    /// Short description for logs and the exhaustion report.
    pub fn describe(&self) -> String {
        match self {
            FetchOutcome::Success(doc) => format!("success ({} bytes)", doc.body.len()),
            FetchOutcome::Blocked => "HTTP 403".to_string(),
            FetchOutcome::RateLimited(_) => "HTTP 429".to_string(),
            FetchOutcome::UnexpectedStatus(code) => format!("HTTP {}", code),
            FetchOutcome::TlsFailure(reason)
            | FetchOutcome::TransientError(reason)
            | FetchOutcome::FatalError(reason) => reason.clone(),
        }
    }
}

/// What the fetch loop does after an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryAction {
    /// Return the body.
    Succeed,
    /// Repeat the request right away with certificate verification disabled.
    RetryInsecure,
    /// Sleep for the delay, then run the next attempt.
    RetryAfter(Duration),
    /// Stop and report this outcome.
    Abort,
    /// The attempt budget is spent.
    Exhausted,
}

/// Decide the next step after `attempt` (1-based) produced `outcome`.
///
/// `Blocked` and `FatalError` abort regardless of the remaining budget. The
/// insecure retry for TLS failures happens inside the same attempt, so it is
/// offered even on the final attempt.
pub fn next_action(
    attempt: u32,
    max_retries: u32,
    base_delay: Duration,
    outcome: &FetchOutcome,
) -> RetryAction {
    let backoff = base_delay.saturating_mul(attempt);
    let retry_in = |delay: Duration| {
        if attempt >= max_retries {
            RetryAction::Exhausted
        } else {
            RetryAction::RetryAfter(delay)
        }
    };

    match outcome {
        FetchOutcome::Success(_) => RetryAction::Succeed,
        FetchOutcome::Blocked | FetchOutcome::FatalError(_) => RetryAction::Abort,
        FetchOutcome::RateLimited(wait) => retry_in(wait.unwrap_or(backoff)),
        FetchOutcome::UnexpectedStatus(_) => retry_in(Duration::ZERO),
        FetchOutcome::TlsFailure(_) => RetryAction::RetryInsecure,
        FetchOutcome::TransientError(_) => retry_in(backoff),
    }
}

/// Action after the certificate-verification-disabled request.
///
/// Only a 200 counts; every other outcome falls through to the next attempt
/// without extra delay.
pub fn next_action_after_insecure(
    attempt: u32,
    max_retries: u32,
    outcome: &FetchOutcome,
) -> RetryAction {
    match outcome {
        FetchOutcome::Success(_) => RetryAction::Succeed,
        _ if attempt >= max_retries => RetryAction::Exhausted,
        _ => RetryAction::RetryAfter(Duration::ZERO),
    }
}

/// Map a non-200 HTTP status (and its Retry-After value) to an outcome.
/// Returns `None` for 200; the caller reads the body.
pub fn classify_status(status: u16, retry_after: Option<&str>) -> Option<FetchOutcome> {
    match status {
        200 => None,
        403 => Some(FetchOutcome::Blocked),
        429 => Some(FetchOutcome::RateLimited(retry_after.and_then(parse_retry_after))),
        other => Some(FetchOutcome::UnexpectedStatus(other)),
    }
}

/// Parse a Retry-After value given in whole seconds.
///
/// HTTP-date values are not supported and yield `None`, which makes the
/// caller fall back to the computed backoff.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Classify a transport error into an attempt outcome.
pub fn classify_error(err: &reqwest::Error) -> FetchOutcome {
    let chain = source_messages(err);
    let reason = err.to_string();

    if mentions_tls(&chain) {
        return FetchOutcome::TlsFailure(reason);
    }
    if err.is_builder() {
        return FetchOutcome::FatalError(reason);
    }
    if err.is_timeout()
        || err.is_connect()
        || err.is_request()
        || err.is_body()
        || err.is_decode()
        || err.is_redirect()
    {
        return FetchOutcome::TransientError(reason);
    }
    FetchOutcome::FatalError(reason)
}

/// Messages of the error's causes, outermost first. The top-level message is
/// skipped since it embeds the request URL.
fn source_messages(err: &reqwest::Error) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(e) = cur {
        out.push(e.to_string());
        cur = e.source();
    }
    out
}

fn mentions_tls(chain: &[String]) -> bool {
    chain.iter().any(|msg| {
        let lower = msg.to_lowercase();
        lower.contains("certificate") || lower.contains("tls") || lower.contains("ssl")
    })
}
