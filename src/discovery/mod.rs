//! Page discovery
//!
//! Three combinable modes produce the set of pages a run will sync: explicit
//! URL lists (with glob expansion), sitemaps, and a bounded breadth-first
//! crawl. Modes run in a fixed order and duplicates are merged by normalized
//! URL, first occurrence winning the position and the lowest depth winning
//! the depth, so discovery output is deterministic for a given site.

mod crawl;
mod links;
mod sitemap;
mod urls;

pub use links::extract_links;

use crate::config::SiteConfig;
use crate::fetch::FetchClient;
use std::collections::HashMap;
use tracing::{info, warn};
use url::Url;

/// A page selected for syncing
#[derive(Debug, Clone)]
pub struct PageTarget {
    /// Normalized page URL
    pub url: Url,

    /// Link depth from a crawl start page; 0 for explicit and sitemap pages
    pub depth: u32,

    /// Page whose links led here, when discovered by expansion or crawling
    pub discovered_from: Option<Url>,
}

/// Discovery output: targets in deterministic order plus non-fatal warnings
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    pub targets: Vec<PageTarget>,
    pub warnings: Vec<String>,
}

/// Discovers all pages for a site
///
/// Never fails: an unreachable sitemap or a bad URL entry degrades to a
/// warning. A site with no discovery configuration falls back to its base
/// URL alone.
pub async fn discover(site: &SiteConfig, client: &mut FetchClient) -> DiscoveryReport {
    let mut set = TargetSet::new();
    let mut warnings = Vec::new();

    if site.pages.is_empty() {
        warnings.push(format!(
            "site '{}' has no pages configuration; syncing the base URL only",
            site.name
        ));
        set.add(site.base_url.clone(), 0, None);
    } else {
        urls::discover_urls(site, client, &mut set, &mut warnings).await;

        if let Some(path) = &site.pages.sitemap {
            sitemap::discover_sitemap(site, client, path, &mut set, &mut warnings).await;
        }

        if let Some(crawl_config) = &site.pages.crawl {
            crawl::discover_crawl(site, client, crawl_config, &mut set, &mut warnings).await;
        }
    }

    for warning in &warnings {
        warn!(site = %site.name, "{}", warning);
    }

    let targets = set.into_targets();
    info!(site = %site.name, pages = targets.len(), "discovery complete");

    DiscoveryReport { targets, warnings }
}

/// Ordered, deduplicated set of page targets
///
/// Keyed by the normalized URL string. Re-adding a known URL keeps its
/// position but lowers its depth if the new sighting is shallower.
#[derive(Debug, Default)]
pub(crate) struct TargetSet {
    order: Vec<String>,
    entries: HashMap<String, PageTarget>,
}

impl TargetSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a target; returns true when the URL was not seen before
    pub(crate) fn add(&mut self, url: Url, depth: u32, discovered_from: Option<Url>) -> bool {
        let key = url.as_str().to_string();

        if let Some(existing) = self.entries.get_mut(&key) {
            if depth < existing.depth {
                existing.depth = depth;
                existing.discovered_from = discovered_from;
            }
            return false;
        }

        self.order.push(key.clone());
        self.entries.insert(
            key,
            PageTarget {
                url,
                depth,
                discovered_from,
            },
        );
        true
    }

    pub(crate) fn contains(&self, url: &Url) -> bool {
        self.entries.contains_key(url.as_str())
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn into_targets(mut self) -> Vec<PageTarget> {
        self.order
            .iter()
            .filter_map(|key| self.entries.remove(key))
            .collect()
    }
}
