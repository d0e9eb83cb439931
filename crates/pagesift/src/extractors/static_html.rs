// ABOUTME: Static extractor: parses fetched HTML and applies the tiered selection passes.
// ABOUTME: Never fails outright; empty or contentless documents yield a labelled empty result.

use scraper::Html;
use tracing::debug;
use url::Url;

use crate::extractors::select::{filter_entries, select_tiered};
use crate::resource::FetchedDocument;
use crate::result::{ExtractionResult, Method};

/// Failure label for an empty response body.
pub const NO_HTML: &str = "No HTML content to parse";

/// Failure label when parsing succeeded but nothing passed the filters.
pub const NO_STATIC_CONTENT: &str = "No content found in static document";

/// Extract entries from a fetched document, resolving links against `base_url`.
pub fn extract_static(doc: &FetchedDocument, base_url: &Url) -> ExtractionResult {
    extract_static_html(&doc.text_utf8(), base_url)
}

/// Extract entries from an HTML string.
pub fn extract_static_html(html: &str, base_url: &Url) -> ExtractionResult {
    if html.trim().is_empty() {
        debug!(url = %base_url, "empty document");
        return ExtractionResult::failure(NO_HTML);
    }

    let document = Html::parse_document(html);
    let candidates = select_tiered(&document.root_element());
    let entries = filter_entries(&candidates, base_url);
    debug!(
        url = %base_url,
        candidates = candidates.len(),
        entries = entries.len(),
        "static extraction finished"
    );

    ExtractionResult::with_entries(entries, Method::Static, NO_STATIC_CONTENT)
}
