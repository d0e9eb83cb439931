// ABOUTME: DOM traversal abstractions shared by the static and rendered extractors.
// ABOUTME: Exposes the ContentNode trait and its scraper-backed implementation.

//! DOM utilities for content selection.
//!
//! Extraction never touches a concrete tree type directly; it walks
//! [`ContentNode`] values, so a parsed HTTP response and a rendered browser
//! snapshot are filtered by the same code.

pub mod node;

pub use node::{ContentNode, NodeKind};
