// ABOUTME: Target URL normalization: defaults the scheme to https and validates the result.
// ABOUTME: Every URL entering the pipeline passes through normalize_target before any request.

use url::Url;

use crate::error::SiftError;

/// Normalize a caller-supplied URL string into an absolute http(s) URL.
///
/// Strings that do not already start with `http://` or `https://` get an
/// `https://` prefix. The result must parse and carry a host.
pub fn normalize_target(raw: &str) -> Result<Url, SiftError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SiftError::invalid_url(raw, "empty URL"));
    }

    let lower = trimmed.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&candidate)
        .map_err(|e| SiftError::invalid_url(raw, format!("malformed URL: {}", e)))?;

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(SiftError::invalid_url(raw, "missing host"));
    }

    Ok(parsed)
}
