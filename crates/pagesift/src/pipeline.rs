// ABOUTME: Pipeline orchestrator: fetch, static extraction, then the rendered fallback when static is empty.
// ABOUTME: Every failure is absorbed into an ExtractionResult; callers never see an Err.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use url::Url;

use crate::error::SiftError;
use crate::extractors::rendered::RenderedExtractor;
use crate::extractors::static_html::{extract_static, extract_static_html};
use crate::identity::IdentityProvider;
use crate::options::{Options, PipelineBuilder};
use crate::renderer::Renderer;
use crate::resource::Fetcher;
use crate::result::ExtractionResult;
use crate::target::normalize_target;

/// Stages a single `process` call moves through. Never re-entered once left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Fetching,
    FetchFailed,
    Fetched,
    StaticExtracting,
    StaticSucceeded,
    StaticEmpty,
    RenderedExtracting,
    RenderedSucceeded,
    RenderedFailed,
}

impl PipelineState {
    /// States that always end a run. `StaticEmpty` also ends one when the
    /// rendered fallback is disabled.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipelineState::FetchFailed
                | PipelineState::StaticSucceeded
                | PipelineState::RenderedSucceeded
                | PipelineState::RenderedFailed
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Idle => "idle",
            PipelineState::Fetching => "fetching",
            PipelineState::FetchFailed => "fetch_failed",
            PipelineState::Fetched => "fetched",
            PipelineState::StaticExtracting => "static_extracting",
            PipelineState::StaticSucceeded => "static_succeeded",
            PipelineState::StaticEmpty => "static_empty",
            PipelineState::RenderedExtracting => "rendered_extracting",
            PipelineState::RenderedSucceeded => "rendered_succeeded",
            PipelineState::RenderedFailed => "rendered_failed",
        };
        f.write_str(s)
    }
}

/// Tracks and logs state transitions for one call.
struct Run<'a> {
    url: &'a str,
    state: PipelineState,
}

impl<'a> Run<'a> {
    fn new(url: &'a str) -> Self {
        Self {
            url,
            state: PipelineState::Idle,
        }
    }

    fn enter(&mut self, next: PipelineState) {
        debug!(url = self.url, from = %self.state, state = %next, "pipeline transition");
        self.state = next;
    }

    fn finish(
        mut self,
        terminal: PipelineState,
        result: ExtractionResult,
    ) -> (ExtractionResult, PipelineState) {
        if self.state != terminal {
            self.enter(terminal);
        }
        info!(url = self.url, state = %terminal, method = %result.method(), entries = result.entries().len(), "pipeline finished");
        (result, terminal)
    }
}

/// Extracts readable content from single web pages.
///
/// `Pipeline` holds configuration and capabilities only; each call gets its own
/// HTTP session and, when needed, its own browser. It can be shared across tasks.
#[derive(Clone)]
pub struct Pipeline {
    opts: Options,
    identity: Arc<dyn IdentityProvider>,
    renderer: Arc<dyn Renderer>,
}

impl Pipeline {
    /// Create a new PipelineBuilder for configuring the pipeline.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn new(
        opts: Options,
        identity: Arc<dyn IdentityProvider>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            opts,
            identity,
            renderer,
        }
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Fetch and extract one page.
    ///
    /// Static extraction runs first. Only when it yields nothing (and the
    /// fallback is enabled) is the page rendered, exactly once.
    pub async fn process(&self, raw_url: &str) -> ExtractionResult {
        let target = match normalize_target(raw_url) {
            Ok(u) => u,
            Err(e) => {
                info!(url = raw_url, error = %e, "rejected target");
                return ExtractionResult::from_error(&e);
            }
        };
        self.run_stages(&target).await.0
    }

    /// Like [`process`](Self::process), but gives up once `deadline` elapses.
    ///
    /// In-flight work is dropped on expiry, which also kills any browser it started.
    pub async fn process_with_deadline(&self, raw_url: &str, deadline: Duration) -> ExtractionResult {
        match tokio::time::timeout(deadline, self.process(raw_url)).await {
            Ok(result) => result,
            Err(_) => {
                let err = SiftError::Timeout {
                    url: raw_url.to_string(),
                    deadline,
                };
                info!(url = raw_url, error = %err, "deadline elapsed");
                ExtractionResult::from_error(&err)
            }
        }
    }

    /// Run the static extractor over markup the caller already has.
    pub fn process_html(&self, html: &str, raw_url: &str) -> ExtractionResult {
        match normalize_target(raw_url) {
            Ok(base) => extract_static_html(html, &base),
            Err(e) => ExtractionResult::from_error(&e),
        }
    }

    /// Drive one target through the stages, returning the result and the state it ended in.
    async fn run_stages(&self, target: &Url) -> (ExtractionResult, PipelineState) {
        let mut run = Run::new(target.as_str());

        run.enter(PipelineState::Fetching);
        let fetched = match Fetcher::new(&self.opts, Arc::clone(&self.identity)) {
            Ok(fetcher) => fetcher.fetch(target).await,
            Err(e) => Err(e.with_url(target.as_str())),
        };
        let doc = match fetched {
            Ok(doc) => doc,
            Err(e) => return run.finish(PipelineState::FetchFailed, ExtractionResult::from_error(&e)),
        };
        run.enter(PipelineState::Fetched);

        run.enter(PipelineState::StaticExtracting);
        // Links resolve against the requested target, not the post-redirect URL.
        let static_result = extract_static(&doc, target);
        if static_result.is_success() {
            return run.finish(PipelineState::StaticSucceeded, static_result);
        }
        run.enter(PipelineState::StaticEmpty);

        if !self.opts.render_fallback {
            debug!(url = %target, "rendered fallback disabled");
            return run.finish(PipelineState::StaticEmpty, static_result);
        }

        run.enter(PipelineState::RenderedExtracting);
        let extractor = RenderedExtractor::new(
            Arc::clone(&self.renderer),
            Arc::clone(&self.identity),
            &self.opts,
        );
        let rendered = extractor.extract(target).await;
        let terminal = if rendered.is_success() {
            PipelineState::RenderedSucceeded
        } else {
            PipelineState::RenderedFailed
        };
        run.finish(terminal, rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::static_html::NO_STATIC_CONTENT;
    use crate::identity::FixedIdentity;
    use crate::renderer::RenderSession;
    use crate::result::{ContentEntry, Method};
    use async_trait::async_trait;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves fixed markup and counts launches.
    struct StubRenderer {
        html: &'static str,
        launches: AtomicUsize,
    }

    struct StubSession(&'static str);

    #[async_trait]
    impl Renderer for StubRenderer {
        async fn launch(&self, _user_agent: &str) -> anyhow::Result<Box<dyn RenderSession>> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StubSession(self.html)))
        }
    }

    #[async_trait]
    impl RenderSession for StubSession {
        async fn navigate(&mut self, _url: &str) -> anyhow::Result<()> {
            Ok(())
        }
        async fn wait_for_element(&mut self, _selector: &str, _timeout: Duration) -> anyhow::Result<()> {
            Ok(())
        }
        async fn content(&mut self) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
        async fn shutdown(self: Box<Self>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn pipeline(renderer: Arc<StubRenderer>, render_fallback: bool) -> Pipeline {
        Pipeline::builder()
            .base_delay(Duration::ZERO)
            .settle_delay(Duration::ZERO)
            .max_retries(1)
            .render_fallback(render_fallback)
            .identity_provider(Arc::new(FixedIdentity("pipeline-test".into())))
            .renderer(renderer)
            .build()
    }

    fn stub(html: &'static str) -> Arc<StubRenderer> {
        Arc::new(StubRenderer {
            html,
            launches: AtomicUsize::new(0),
        })
    }

    #[test]
    fn terminal_states() {
        assert!(PipelineState::FetchFailed.is_terminal());
        assert!(PipelineState::RenderedFailed.is_terminal());
        assert!(!PipelineState::StaticEmpty.is_terminal());
        assert_eq!(PipelineState::StaticEmpty.to_string(), "static_empty");
    }

    #[tokio::test]
    async fn invalid_target_never_fetches() {
        let renderer = stub("");
        let result = pipeline(Arc::clone(&renderer), true).process("   ").await;
        assert!(result.failure_reason().unwrap().starts_with("Invalid URL"));
        assert_eq!(renderer.launches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn static_success_skips_renderer() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/page");
            then.status(200)
                .header("content-type", "text/html")
                .body("<html><body><main><h1>Headline that is quite long</h1></main></body></html>");
        });
        let renderer = stub("");

        let result = pipeline(Arc::clone(&renderer), true)
            .process(&server.url("/page"))
            .await;

        assert_eq!(result.method(), &Method::Static);
        assert_eq!(
            result.entries(),
            &[ContentEntry::text("Headline that is quite long")]
        );
        assert_eq!(renderer.launches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn disabled_fallback_returns_static_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/spa");
            then.status(200).body("<html><body><div id='app'></div></body></html>");
        });
        let renderer = stub("<p>Rendered paragraph long enough</p>");

        let target = Url::parse(&server.url("/spa")).unwrap();
        let (result, last) = pipeline(Arc::clone(&renderer), false)
            .run_stages(&target)
            .await;

        assert_eq!(result.failure_reason(), Some(NO_STATIC_CONTENT));
        assert_eq!(last, PipelineState::StaticEmpty);
        assert_eq!(renderer.launches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn enabled_fallback_ends_in_rendered_state() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/spa");
            then.status(200).body("<html><body><div id='app'></div></body></html>");
        });
        let renderer = stub("<p>Rendered paragraph long enough</p>");

        let target = Url::parse(&server.url("/spa")).unwrap();
        let (result, last) = pipeline(Arc::clone(&renderer), true)
            .run_stages(&target)
            .await;

        assert_eq!(result.method(), &Method::Rendered);
        assert_eq!(last, PipelineState::RenderedSucceeded);
        assert_eq!(renderer.launches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn process_html_uses_static_extractor() {
        let result = pipeline(stub(""), true).process_html(
            "<article><p>Local file paragraph text</p><a href='/n'>Next</a></article>",
            "example.com/dir/",
        );
        assert_eq!(
            result.entries(),
            &[
                ContentEntry::text("Local file paragraph text"),
                ContentEntry::link("Next", "https://example.com/n"),
            ]
        );
    }

    #[tokio::test]
    async fn deadline_expiry_reports_timeout() {
        let slow = Pipeline::builder()
            .base_delay(Duration::from_secs(30))
            .renderer(stub(""))
            .build();

        let result = slow
            .process_with_deadline("https://example.invalid/", Duration::from_secs(1))
            .await;

        assert_eq!(result.failure_reason(), Some("Timed out after 1s"));
    }

    #[tokio::test]
    async fn sub_second_deadline_keeps_its_fraction() {
        let slow = Pipeline::builder()
            .base_delay(Duration::from_secs(30))
            .renderer(stub(""))
            .build();

        let result = slow
            .process_with_deadline("https://example.invalid/", Duration::from_millis(250))
            .await;

        assert_eq!(result.failure_reason(), Some("Timed out after 0.25s"));
    }
}
