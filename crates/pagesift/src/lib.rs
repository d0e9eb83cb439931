// ABOUTME: Main library entry point for pagesift, a single-page web content extractor.
// ABOUTME: Re-exports the public API: Pipeline, PipelineBuilder, Options, ExtractionResult, SiftError.

//! pagesift - fetch one web page and pull out its readable content.
//!
//! A [`Pipeline`] fetches the page with retries and a rotating request
//! identity, extracts paragraphs, headings and links from the static HTML,
//! and falls back to a headless browser when the static document yields
//! nothing. Every outcome is an [`ExtractionResult`]: either a non-empty list
//! of entries labelled `static`/`rendered`, or a human-readable failure reason.
//!
//! # Example
//!
//! ```no_run
//! use pagesift::Pipeline;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pipeline = Pipeline::builder().build();
//!     let result = pipeline.process("example.com/article").await;
//!     match result.failure_reason() {
//!         Some(reason) => eprintln!("Failed to extract content: {}", reason),
//!         None => println!("{}", result.format_numbered()),
//!     }
//! }
//! ```

pub mod dom;
pub mod error;
pub mod extractors;
pub mod identity;
pub mod options;
pub mod pipeline;
pub mod renderer;
pub mod resource;
pub mod result;
pub mod target;

pub use crate::error::{ErrorCode, SiftError};
pub use crate::identity::{FixedIdentity, IdentityProvider, RandomIdentity, RequestIdentity};
pub use crate::options::{Options, PipelineBuilder};
pub use crate::pipeline::{Pipeline, PipelineState};
pub use crate::renderer::{RenderSession, Renderer};
pub use crate::result::{ContentEntry, ExtractionResult, Method};
pub use crate::target::normalize_target;
