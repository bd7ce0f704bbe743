use super::TargetSet;
use crate::config::SiteConfig;
use crate::fetch::FetchClient;
use crate::url::{normalize, same_origin};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Discovers pages from a sitemap, following sitemap index files
///
/// Page URLs keep document order. Cross-origin entries are ignored and any
/// unreachable or malformed sitemap degrades to a warning.
pub(crate) async fn discover_sitemap(
    site: &SiteConfig,
    client: &mut FetchClient,
    path: &str,
    set: &mut TargetSet,
    warnings: &mut Vec<String>,
) {
    let first = match normalize(&site.base_url, path) {
        Ok(url) => url,
        Err(err) => {
            warnings.push(format!("skipping sitemap '{}': {}", path, err));
            return;
        }
    };

    let mut pending = VecDeque::from([first]);
    let mut visited = HashSet::new();

    while let Some(sitemap_url) = pending.pop_front() {
        if !visited.insert(sitemap_url.as_str().to_string()) {
            continue;
        }

        debug!(url = %sitemap_url, "fetching sitemap");

        let outcome = client.fetch(&sitemap_url).await;
        let body = match outcome.body {
            Some(body) if outcome.is_ok() => body,
            _ => {
                warnings.push(format!(
                    "sitemap {} could not be fetched ({})",
                    sitemap_url,
                    outcome.status.as_str()
                ));
                continue;
            }
        };

        let doc = match parse_sitemap(&body) {
            Ok(doc) => doc,
            Err(err) => {
                warnings.push(format!("sitemap {} is not valid XML: {}", sitemap_url, err));
                continue;
            }
        };

        for loc in doc.pages {
            match normalize(&sitemap_url, &loc) {
                Ok(url) if same_origin(&url, &site.base_url) => {
                    set.add(url, 0, Some(sitemap_url.clone()));
                }
                Ok(url) => {
                    debug!(url = %url, "ignoring cross-origin sitemap entry");
                }
                Err(err) => {
                    warnings.push(format!(
                        "sitemap {} has an invalid entry '{}': {}",
                        sitemap_url, loc, err
                    ));
                }
            }
        }

        for loc in doc.nested {
            if let Ok(url) = normalize(&sitemap_url, &loc) {
                if same_origin(&url, &site.base_url) {
                    pending.push_back(url);
                }
            }
        }
    }
}

#[derive(Debug, Default)]
struct SitemapDoc {
    /// `<loc>` entries under `<url>` elements
    pages: Vec<String>,

    /// `<loc>` entries under `<sitemap>` elements of an index file
    nested: Vec<String>,
}

fn parse_sitemap(xml: &str) -> Result<SitemapDoc, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut doc = SitemapDoc::default();
    let mut in_loc = false;
    let mut in_index_entry = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                // Names are matched by suffix so namespace prefixes don't matter
                let name = e.name();
                if name.as_ref().ends_with(b"sitemap") {
                    in_index_entry = true;
                } else if name.as_ref().ends_with(b"loc") {
                    in_loc = true;
                }
            }
            Event::End(e) => {
                let name = e.name();
                if name.as_ref().ends_with(b"sitemap") {
                    in_index_entry = false;
                } else if name.as_ref().ends_with(b"loc") {
                    in_loc = false;
                }
            }
            Event::Text(t) if in_loc => {
                let loc = t.unescape()?.trim().to_string();
                if !loc.is_empty() {
                    if in_index_entry {
                        doc.nested.push(loc);
                    } else {
                        doc.pages.push(loc);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <url><loc>https://example.com/</loc><lastmod>2026-01-01</lastmod></url>
                <url><loc>https://example.com/about</loc></url>
            </urlset>"#;

        let doc = parse_sitemap(xml).unwrap();
        assert_eq!(
            doc.pages,
            vec!["https://example.com/", "https://example.com/about"]
        );
        assert!(doc.nested.is_empty());
    }

    #[test]
    fn test_parse_sitemap_index() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <sitemap><loc>https://example.com/sitemap-a.xml</loc></sitemap>
                <sitemap><loc>https://example.com/sitemap-b.xml</loc></sitemap>
            </sitemapindex>"#;

        let doc = parse_sitemap(xml).unwrap();
        assert!(doc.pages.is_empty());
        assert_eq!(
            doc.nested,
            vec![
                "https://example.com/sitemap-a.xml",
                "https://example.com/sitemap-b.xml"
            ]
        );
    }

    #[test]
    fn test_parse_preserves_document_order() {
        let xml = r#"<urlset>
            <url><loc>https://example.com/c</loc></url>
            <url><loc>https://example.com/a</loc></url>
            <url><loc>https://example.com/b</loc></url>
        </urlset>"#;

        let doc = parse_sitemap(xml).unwrap();
        assert_eq!(
            doc.pages,
            vec![
                "https://example.com/c",
                "https://example.com/a",
                "https://example.com/b"
            ]
        );
    }

    #[test]
    fn test_parse_escaped_entities() {
        let xml = r#"<urlset>
            <url><loc>https://example.com/search?q=a&amp;b</loc></url>
        </urlset>"#;

        let doc = parse_sitemap(xml).unwrap();
        assert_eq!(doc.pages, vec!["https://example.com/search?q=a&b"]);
    }

    #[test]
    fn test_parse_malformed_xml() {
        assert!(parse_sitemap("<urlset><url><loc>x</urlset>").is_err());
    }
}
