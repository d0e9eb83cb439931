// ABOUTME: Browser abstraction used by the rendered fallback: Renderer launches, RenderSession drives.
// ABOUTME: Production uses the chromium submodule; tests substitute scripted sessions.

//! Headless-browser seam for the rendered extractor.
//!
//! A [`Renderer`] starts one browser per extraction; the [`RenderSession`] it
//! returns is driven through navigate, wait and capture, then shut down.

pub mod chromium;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

/// A browser engine that can start sessions.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Start a browser process whose requests carry `user_agent`.
    async fn launch(&self, user_agent: &str) -> Result<Box<dyn RenderSession>>;
}

/// One running browser. Must be shut down by the caller on every path.
#[async_trait]
pub trait RenderSession: Send {
    /// Load a URL.
    async fn navigate(&mut self, url: &str) -> Result<()>;
    /// Block until an element matching `selector` exists, up to `timeout`.
    async fn wait_for_element(&mut self, selector: &str, timeout: Duration) -> Result<()>;
    /// The current rendered markup.
    async fn content(&mut self) -> Result<String>;
    /// Close the page and terminate the browser process.
    async fn shutdown(self: Box<Self>) -> Result<()>;
}
