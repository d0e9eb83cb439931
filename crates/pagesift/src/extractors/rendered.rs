// ABOUTME: Rendered extractor: loads the target in a headless browser and extracts from the live DOM.
// ABOUTME: The browser session is shut down on every path; failures become labelled empty results.

use std::sync::Arc;
use std::time::Duration;

use scraper::Html;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::SiftError;
use crate::extractors::select::{filter_entries, select_flat};
use crate::identity::IdentityProvider;
use crate::options::Options;
use crate::renderer::{RenderSession, Renderer};
use crate::result::{ExtractionResult, Method, NO_CONTENT};

/// Extracts content from a browser-rendered page.
pub struct RenderedExtractor {
    renderer: Arc<dyn Renderer>,
    identity: Arc<dyn IdentityProvider>,
    body_wait_timeout: Duration,
    settle_delay: Duration,
}

impl RenderedExtractor {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        identity: Arc<dyn IdentityProvider>,
        opts: &Options,
    ) -> Self {
        Self {
            renderer,
            identity,
            body_wait_timeout: opts.body_wait_timeout,
            settle_delay: opts.settle_delay,
        }
    }

    /// Render `target` and extract with the whole-document pass.
    pub async fn extract(&self, target: &Url) -> ExtractionResult {
        match self.render(target).await {
            Ok(html) => {
                let result = extract_rendered_html(&html, target);
                info!(url = %target, entries = result.entries().len(), "rendered extraction finished");
                result
            }
            Err(e) => {
                let err = SiftError::render(target.as_str(), e);
                error!(url = %target, error = %err, "rendered extraction failed");
                ExtractionResult::from_error(&err)
            }
        }
    }

    async fn render(&self, target: &Url) -> anyhow::Result<String> {
        let identity = self.identity.identity();
        let mut session = self.renderer.launch(&identity.user_agent).await?;

        let captured = self.capture(session.as_mut(), target).await;
        if let Err(e) = session.shutdown().await {
            warn!(url = %target, error = %e, "browser shutdown failed");
        }
        captured
    }

    async fn capture(&self, session: &mut dyn RenderSession, target: &Url) -> anyhow::Result<String> {
        session.navigate(target.as_str()).await?;
        session
            .wait_for_element("body", self.body_wait_timeout)
            .await?;
        debug!(url = %target, settle_ms = self.settle_delay.as_millis() as u64, "waiting for page to settle");
        tokio::time::sleep(self.settle_delay).await;
        session.content().await
    }
}

/// Extract from rendered markup using the flat whole-document pass.
pub fn extract_rendered_html(html: &str, base_url: &Url) -> ExtractionResult {
    let document = Html::parse_document(html);
    let candidates = select_flat(&document.root_element());
    let entries = filter_entries(&candidates, base_url);
    ExtractionResult::with_entries(entries, Method::Rendered, NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::FixedIdentity;
    use crate::result::ContentEntry;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Copy, PartialEq)]
    enum FailAt {
        Nowhere,
        Launch,
        Navigate,
        Wait,
    }

    struct ScriptedRenderer {
        html: String,
        fail_at: FailAt,
        launches: AtomicUsize,
        shutdowns: Arc<AtomicUsize>,
        agents: Mutex<Vec<String>>,
    }

    impl ScriptedRenderer {
        fn new(html: &str, fail_at: FailAt) -> Self {
            Self {
                html: html.to_string(),
                fail_at,
                launches: AtomicUsize::new(0),
                shutdowns: Arc::new(AtomicUsize::new(0)),
                agents: Mutex::new(Vec::new()),
            }
        }
    }

    struct ScriptedSession {
        html: String,
        fail_at: FailAt,
        shutdowns: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Renderer for ScriptedRenderer {
        async fn launch(&self, user_agent: &str) -> anyhow::Result<Box<dyn RenderSession>> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            self.agents.lock().unwrap().push(user_agent.to_string());
            if self.fail_at == FailAt::Launch {
                return Err(anyhow!("chrome not found"));
            }
            Ok(Box::new(ScriptedSession {
                html: self.html.clone(),
                fail_at: self.fail_at,
                shutdowns: Arc::clone(&self.shutdowns),
            }))
        }
    }

    #[async_trait]
    impl RenderSession for ScriptedSession {
        async fn navigate(&mut self, _url: &str) -> anyhow::Result<()> {
            if self.fail_at == FailAt::Navigate {
                return Err(anyhow!("net::ERR_NAME_NOT_RESOLVED"));
            }
            Ok(())
        }

        async fn wait_for_element(&mut self, selector: &str, _timeout: Duration) -> anyhow::Result<()> {
            if self.fail_at == FailAt::Wait {
                return Err(anyhow!("timed out waiting for <{}>", selector));
            }
            Ok(())
        }

        async fn content(&mut self) -> anyhow::Result<String> {
            Ok(self.html.clone())
        }

        async fn shutdown(self: Box<Self>) -> anyhow::Result<()> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn extractor(renderer: Arc<ScriptedRenderer>) -> RenderedExtractor {
        let opts = Options {
            settle_delay: Duration::ZERO,
            ..Default::default()
        };
        RenderedExtractor::new(renderer, Arc::new(FixedIdentity("render-agent".into())), &opts)
    }

    fn target() -> Url {
        Url::parse("https://example.com/app").unwrap()
    }

    #[tokio::test]
    async fn renders_and_extracts_whole_document() {
        let renderer = Arc::new(ScriptedRenderer::new(
            r#"<html><body><div id="root">
                <p>Content injected by client-side script</p>
                <a href="/next">Next</a>
            </div></body></html>"#,
            FailAt::Nowhere,
        ));

        let result = extractor(Arc::clone(&renderer)).extract(&target()).await;

        assert_eq!(result.method(), &Method::Rendered);
        assert_eq!(
            result.entries(),
            &[
                ContentEntry::text("Content injected by client-side script"),
                ContentEntry::link("Next", "https://example.com/next"),
            ]
        );
        assert_eq!(renderer.shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(*renderer.agents.lock().unwrap(), vec!["render-agent".to_string()]);
    }

    #[tokio::test]
    async fn rendered_pass_does_not_tier() {
        // An article would win the static tiers; the rendered pass takes everything.
        let renderer = Arc::new(ScriptedRenderer::new(
            r#"<html><body>
                <p>Paragraph outside of the article tag</p>
                <article><p>Paragraph inside of the article tag</p></article>
            </body></html>"#,
            FailAt::Nowhere,
        ));

        let result = extractor(renderer).extract(&target()).await;
        assert_eq!(result.entries().len(), 2);
    }

    #[tokio::test]
    async fn navigation_failure_still_shuts_down() {
        let renderer = Arc::new(ScriptedRenderer::new("", FailAt::Navigate));

        let result = extractor(Arc::clone(&renderer)).extract(&target()).await;

        assert!(result.entries().is_empty());
        assert_eq!(
            result.failure_reason(),
            Some("Rendered extraction error: net::ERR_NAME_NOT_RESOLVED")
        );
        assert_eq!(renderer.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn body_wait_timeout_still_shuts_down() {
        let renderer = Arc::new(ScriptedRenderer::new("", FailAt::Wait));

        let result = extractor(Arc::clone(&renderer)).extract(&target()).await;

        assert_eq!(
            result.failure_reason(),
            Some("Rendered extraction error: timed out waiting for <body>")
        );
        assert_eq!(renderer.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn launch_failure_is_absorbed() {
        let renderer = Arc::new(ScriptedRenderer::new("", FailAt::Launch));

        let result = extractor(Arc::clone(&renderer)).extract(&target()).await;

        assert_eq!(
            result.failure_reason(),
            Some("Rendered extraction error: chrome not found")
        );
        assert_eq!(renderer.launches.load(Ordering::SeqCst), 1);
        assert_eq!(renderer.shutdowns.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_render_reports_no_content() {
        let renderer = Arc::new(ScriptedRenderer::new(
            "<html><body><p>tiny</p></body></html>",
            FailAt::Nowhere,
        ));

        let result = extractor(renderer).extract(&target()).await;
        assert_eq!(result.failure_reason(), Some(NO_CONTENT));
    }
}
