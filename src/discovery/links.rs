use crate::url::normalize;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts and normalizes all followable links from an HTML document
///
/// Skips non-navigational schemes and bare fragments; relative links resolve
/// against `base`. Output preserves document order with duplicates removed.
pub fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let href = match element.value().attr("href") {
            Some(href) => href.trim(),
            None => continue,
        };

        if href.is_empty() || href.starts_with('#') || has_skipped_scheme(href) {
            continue;
        }

        if let Ok(resolved) = normalize(base, href) {
            if seen.insert(resolved.as_str().to_string()) {
                links.push(resolved);
            }
        }
    }

    links
}

fn has_skipped_scheme(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}
