// ABOUTME: Configuration options for the pagesift pipeline and the PipelineBuilder.
// ABOUTME: PipelineBuilder provides a fluent API for tuning retries and delays and injecting capabilities.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::identity::{IdentityProvider, RandomIdentity};
use crate::pipeline::Pipeline;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;

/// Environment variable naming the Chrome/Chromium executable for rendering.
pub const CHROME_PATH_ENV: &str = "PAGESIFT_CHROME_PATH";

/// Configuration options for the pipeline.
#[derive(Debug, Clone)]
pub struct Options {
    /// Fetch attempts before giving up.
    pub max_retries: u32,
    /// Pre-request throttle and backoff unit.
    pub base_delay: Duration,
    /// Timeout for a single HTTP request.
    pub request_timeout: Duration,
    /// Upper bound on waiting for the rendered `body` element.
    pub body_wait_timeout: Duration,
    /// Pause after the body appears so deferred content can populate.
    pub settle_delay: Duration,
    /// Upper bound on browser navigation.
    pub navigation_timeout: Duration,
    /// Whether an empty static extraction falls back to the browser.
    pub render_fallback: bool,
    pub chrome_executable: Option<PathBuf>,
    /// Extra headers sent on every request, after the identity headers.
    pub headers: HashMap<String, String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(10),
            body_wait_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_secs(5),
            navigation_timeout: Duration::from_secs(30),
            render_fallback: true,
            chrome_executable: None,
            headers: HashMap::new(),
        }
    }
}

impl Options {
    /// Resolve the browser executable: explicit option first, then the environment.
    pub fn resolved_chrome_executable(&self) -> Option<PathBuf> {
        self.chrome_executable.clone().or_else(|| {
            std::env::var_os(CHROME_PATH_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
    }
}

/// Builder for constructing Pipeline instances with custom configuration.
#[derive(Clone)]
pub struct PipelineBuilder {
    opts: Options,
    identity: Option<Arc<dyn IdentityProvider>>,
    renderer: Option<Arc<dyn Renderer>>,
}

impl PipelineBuilder {
    /// Create a new PipelineBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
            identity: None,
            renderer: None,
        }
    }

    /// Start from an existing set of options.
    pub fn options(mut self, opts: Options) -> Self {
        self.opts = opts;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.opts.max_retries = max_retries;
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.opts.base_delay = delay;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.opts.request_timeout = timeout;
        self
    }

    pub fn body_wait_timeout(mut self, timeout: Duration) -> Self {
        self.opts.body_wait_timeout = timeout;
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.opts.settle_delay = delay;
        self
    }

    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.opts.navigation_timeout = timeout;
        self
    }

    /// Enable or disable the headless-browser fallback.
    pub fn render_fallback(mut self, enabled: bool) -> Self {
        self.opts.render_fallback = enabled;
        self
    }

    /// Use a specific Chrome/Chromium executable.
    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.opts.chrome_executable = Some(path.into());
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Replace the identity source used for request headers and the browser agent.
    pub fn identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(provider);
        self
    }

    /// Replace the browser used by the rendered fallback.
    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Build the Pipeline with the configured options.
    pub fn build(self) -> Pipeline {
        let identity = self
            .identity
            .unwrap_or_else(|| Arc::new(RandomIdentity) as Arc<dyn IdentityProvider>);
        let renderer = self.renderer.unwrap_or_else(|| {
            Arc::new(ChromiumRenderer::new(&self.opts)) as Arc<dyn Renderer>
        });
        Pipeline::new(self.opts, identity, renderer)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
