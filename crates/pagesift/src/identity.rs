// ABOUTME: Browser identity pool: user-agent strings plus the static request header template.
// ABOUTME: IdentityProvider is the injectable capability; RandomIdentity draws a fresh agent per call.

use rand::seq::SliceRandom;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION,
    USER_AGENT,
};

/// Desktop Chrome user agents rotated across requests.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 11_3) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.5412.99 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.5361.172 Safari/537.36",
    "Mozilla/5.0 (X11; Linux i686) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.5388.177 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 11_14) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.5397.215 Safari/537.36",
];

const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";
const DEFAULT_ACCEPT_ENCODING: &str = "gzip, deflate, br";
const DEFAULT_CONNECTION: &str = "keep-alive";

/// The header set sent with one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub accept_encoding: String,
    pub connection: String,
}

impl RequestIdentity {
    /// Build an identity around `user_agent` using the static header template.
    pub fn with_user_agent(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            accept: DEFAULT_ACCEPT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            accept_encoding: DEFAULT_ACCEPT_ENCODING.to_string(),
            connection: DEFAULT_CONNECTION.to_string(),
        }
    }

    /// Convert to request headers. Values that are not valid header text are skipped.
    pub fn to_headers(&self) -> HeaderMap {
        let pairs: [(HeaderName, &str); 5] = [
            (USER_AGENT, self.user_agent.as_str()),
            (ACCEPT, self.accept.as_str()),
            (ACCEPT_LANGUAGE, self.accept_language.as_str()),
            (ACCEPT_ENCODING, self.accept_encoding.as_str()),
            (CONNECTION, self.connection.as_str()),
        ];

        let mut headers = HeaderMap::with_capacity(pairs.len());
        for (name, value) in pairs {
            if let Ok(v) = HeaderValue::from_str(value) {
                headers.insert(name, v);
            }
        }
        headers
    }
}

/// Supplies request identities. Implementations must be cheap and thread-safe.
pub trait IdentityProvider: Send + Sync {
    /// Return the identity to use for the next request.
    fn identity(&self) -> RequestIdentity;
}

/// Draws a random agent from [`USER_AGENTS`] on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdentity;

impl IdentityProvider for RandomIdentity {
    fn identity(&self) -> RequestIdentity {
        let agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);
        RequestIdentity::with_user_agent(agent)
    }
}

/// Always returns the same user agent. Useful for tests and pinned deployments.
#[derive(Debug, Clone)]
pub struct FixedIdentity(pub String);

impl IdentityProvider for FixedIdentity {
    fn identity(&self) -> RequestIdentity {
        RequestIdentity::with_user_agent(self.0.clone())
    }
}
