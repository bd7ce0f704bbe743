use super::links::extract_links;
use super::TargetSet;
use crate::config::{CrawlConfig, SiteConfig};
use crate::fetch::FetchClient;
use crate::url::{normalize, same_origin, should_include};
use std::collections::{HashSet, VecDeque};
use tracing::debug;
use url::Url;

/// Breadth-first crawl from the configured start page
///
/// Links are filtered at enqueue time: same origin, unvisited, path passes
/// include/exclude, depth within `max_depth`, and the `max_pages` budget not
/// yet spent. The start page itself is always admitted. A page's links are
/// only followed while its depth is below `max_depth`, so a page at the
/// depth limit is synced but never expanded.
pub(crate) async fn discover_crawl(
    site: &SiteConfig,
    client: &mut FetchClient,
    config: &CrawlConfig,
    set: &mut TargetSet,
    warnings: &mut Vec<String>,
) {
    let start = match normalize(&site.base_url, &config.start) {
        Ok(url) => url,
        Err(err) => {
            warnings.push(format!(
                "skipping crawl: invalid start path '{}': {}",
                config.start, err
            ));
            return;
        }
    };

    let mut frontier: VecDeque<(Url, u32, Option<Url>)> = VecDeque::from([(start.clone(), 0, None)]);
    let mut visited: HashSet<String> = HashSet::from([start.as_str().to_string()]);
    let mut admitted = 1usize;

    while let Some((url, depth, parent)) = frontier.pop_front() {
        set.add(url.clone(), depth, parent);

        // No expansion once the depth limit or the page budget is reached
        if depth >= config.max_depth || admitted >= config.max_pages {
            continue;
        }

        debug!(url = %url, depth, "crawling for links");

        let outcome = client.fetch(&url).await;
        let body = match outcome.body {
            Some(body) if outcome.is_ok() => body,
            _ => {
                warnings.push(format!(
                    "crawl could not expand {} ({})",
                    url,
                    outcome.status.as_str()
                ));
                continue;
            }
        };

        for link in extract_links(&body, &url) {
            if admitted >= config.max_pages {
                debug!(max_pages = config.max_pages, "crawl page budget reached");
                break;
            }

            if !same_origin(&link, &site.base_url) {
                continue;
            }
            if visited.contains(link.as_str()) {
                continue;
            }
            if !should_include(link.path(), &config.include, &config.exclude) {
                continue;
            }

            visited.insert(link.as_str().to_string());
            frontier.push_back((link, depth + 1, Some(url.clone())));
            admitted += 1;
        }
    }
}
