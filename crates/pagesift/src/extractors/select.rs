// ABOUTME: Candidate selection passes and entry filtering over ContentNode trees.
// ABOUTME: Tiered passes (article, main, content-class divs) with a whole-document fallback.

//! Node selection and filtering.
//!
//! Key behaviors:
//! - Passes 1-3 accumulate: the first `article`, the first `main`, then every
//!   `div` carrying a known content class. Overlapping nodes are kept twice.
//! - Pass 4 (whole document) runs only when passes 1-3 found nothing.
//! - Links need a non-empty `href` and are resolved against the base URL.
//! - Other nodes keep their trimmed text when it is longer than
//!   [`MIN_TEXT_CHARS`] characters. Inner whitespace is left as is.

use tracing::debug;
use url::Url;

use crate::dom::{ContentNode, NodeKind};
use crate::result::ContentEntry;

/// Class names that mark a `div` as a content container.
pub const CONTENT_CLASSES: &[&str] = &["content", "post-content", "entry-content", "article-content"];

/// Text entries must be strictly longer than this many characters.
pub const MIN_TEXT_CHARS: usize = 20;

/// Paragraph, heading and link descendants of `container`, in document order.
pub fn content_nodes_within<N: ContentNode>(container: &N) -> Vec<N> {
    container
        .descendants()
        .into_iter()
        .filter(|n| n.kind().is_content())
        .collect()
}

/// Candidates from the tiered passes, falling back to the whole document.
pub fn select_tiered<N: ContentNode>(root: &N) -> Vec<N> {
    let all = root.descendants();
    let mut candidates = Vec::new();

    if let Some(article) = all.iter().find(|n| n.tag_name() == "article") {
        candidates.extend(content_nodes_within(article));
    }
    if let Some(main) = all.iter().find(|n| n.tag_name() == "main") {
        candidates.extend(content_nodes_within(main));
    }
    for div in all.iter().filter(|n| is_content_div(*n)) {
        candidates.extend(content_nodes_within(div));
    }

    if candidates.is_empty() {
        debug!("no structured container matched, using whole document");
        return select_flat(root);
    }
    candidates
}

/// Candidates from the whole document, no tiering.
pub fn select_flat<N: ContentNode>(root: &N) -> Vec<N> {
    content_nodes_within(root)
}

fn is_content_div<N: ContentNode>(node: &N) -> bool {
    node.tag_name() == "div" && CONTENT_CLASSES.iter().any(|c| node.has_class(c))
}

/// Turn candidate nodes into entries, dropping short text and href-less links.
pub fn filter_entries<N: ContentNode>(nodes: &[N], base_url: &Url) -> Vec<ContentEntry> {
    let mut entries = Vec::new();
    for node in nodes {
        match node.kind() {
            NodeKind::Link => {
                let href = match node.attribute("href").map(str::trim) {
                    Some(h) if !h.is_empty() => h,
                    _ => continue,
                };
                match base_url.join(href) {
                    Ok(resolved) => entries.push(ContentEntry::link(
                        node.text_content().trim(),
                        resolved.to_string(),
                    )),
                    Err(e) => debug!(href, error = %e, "skipping unresolvable link"),
                }
            }
            _ => {
                let raw = node.text_content();
                let text = raw.trim();
                if text.chars().count() > MIN_TEXT_CHARS {
                    entries.push(ContentEntry::text(text));
                }
            }
        }
    }
    entries
}
