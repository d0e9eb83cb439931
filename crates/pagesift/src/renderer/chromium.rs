// ABOUTME: Chromium renderer built on chromiumoxide: one headless browser process per session.
// ABOUTME: Sessions close the page and browser on shutdown; dropping a session kills the process.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{RenderSession, Renderer};
use crate::options::Options;

/// Poll interval while waiting for an element to appear.
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launches a fresh headless Chromium for every session.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    executable: Option<PathBuf>,
    navigation_timeout: Duration,
}

impl ChromiumRenderer {
    /// Configure from options. No browser is started until `launch`.
    pub fn new(opts: &Options) -> Self {
        Self {
            executable: opts.resolved_chrome_executable(),
            navigation_timeout: opts.navigation_timeout,
        }
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn launch(&self, user_agent: &str) -> Result<Box<dyn RenderSession>> {
        let mut builder = BrowserConfig::builder()
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg(format!("--user-agent={}", user_agent))
            .request_timeout(self.navigation_timeout);
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        debug!(user_agent, "launched headless browser");
        Ok(Box::new(ChromiumSession {
            browser,
            page: None,
            handler_task,
            navigation_timeout: self.navigation_timeout,
        }))
    }
}

/// A running Chromium process with at most one page.
pub struct ChromiumSession {
    browser: Browser,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
    navigation_timeout: Duration,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page> {
        self.page.as_ref().context("no page loaded")
    }
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let timeout = self.navigation_timeout;
        let page = tokio::time::timeout(timeout, self.browser.new_page(url))
            .await
            .map_err(|_| anyhow!("navigation timed out after {}s", timeout.as_secs()))?
            .context("navigation failed")?;
        self.page = Some(page);
        Ok(())
    }

    async fn wait_for_element(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let page = self.page()?;
        tokio::time::timeout(timeout, async {
            while page.find_element(selector).await.is_err() {
                tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
            }
        })
        .await
        .map_err(|_| anyhow!("timed out after {}s waiting for <{}>", timeout.as_secs(), selector))
    }

    async fn content(&mut self) -> Result<String> {
        self.page()?
            .content()
            .await
            .context("failed to read rendered markup")
    }

    async fn shutdown(self: Box<Self>) -> Result<()> {
        let mut this = self;
        if let Some(page) = this.page.take() {
            if let Err(e) = page.close().await {
                warn!(error = %e, "failed to close page");
            }
        }
        this.browser
            .close()
            .await
            .context("failed to close browser")?;
        if let Err(e) = this.browser.wait().await {
            warn!(error = %e, "failed to reap browser process");
        }
        Ok(())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        // Browser's own Drop kills the child process if it is still running.
        self.handler_task.abort();
    }
}
