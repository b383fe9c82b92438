//! Hyperlink extraction from index documents.

use std::path::Path;
use std::sync::OnceLock;

use scraper::{Html, Selector};

use crate::PipelineError;

fn anchors() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("a[href]").expect("anchor selector is valid"))
}

/// Returns the `href` of every anchor in document order. Anchors without
/// one are skipped. The parser recovers from broken markup the way a
/// browser would, so this never fails.
pub fn extract_links(document: &str) -> Vec<String> {
    let html = Html::parse_document(document);
    html.select(anchors())
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Reads an index file, lossily if it is not UTF-8, and extracts its links.
pub async fn extract_links_from_file(path: &Path) -> Result<Vec<String>, PipelineError> {
    let raw = tokio::fs::read(path).await?;
    let links = extract_links(&String::from_utf8_lossy(&raw));
    log::debug!("{} links in {}", links.len(), path.display());
    Ok(links)
}
