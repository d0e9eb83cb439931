// ABOUTME: Content extraction strategies: static HTML parsing and headless-browser rendering.
// ABOUTME: Both strategies share the selection and filtering rules in `select`.

//! Content extraction module.
//!
//! Submodules:
//! - `select`: tiered and flat node selection plus entry filtering.
//! - `static_html`: extraction from a fetched document.
//! - `rendered`: extraction from a browser-rendered DOM, used as a fallback.

pub mod rendered;
pub mod select;
pub mod static_html;
