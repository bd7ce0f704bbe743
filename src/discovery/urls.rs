use super::links::extract_links;
use super::TargetSet;
use crate::config::SiteConfig;
use crate::fetch::FetchClient;
use crate::url::{matches_pattern, normalize, same_origin};
use tracing::debug;
use url::Url;

/// Resolves the explicit `pages.urls` entries
///
/// Plain entries become targets directly. Entries containing `*` are
/// expanded by fetching the fixed directory prefix before the first
/// wildcard and collecting same-origin links whose path matches the
/// pattern.
pub(crate) async fn discover_urls(
    site: &SiteConfig,
    client: &mut FetchClient,
    set: &mut TargetSet,
    warnings: &mut Vec<String>,
) {
    for entry in &site.pages.urls {
        if entry.contains('*') {
            expand_glob(site, client, entry, set, warnings).await;
        } else {
            match normalize(&site.base_url, entry) {
                Ok(url) => {
                    set.add(url, 0, None);
                }
                Err(err) => {
                    warnings.push(format!("skipping invalid URL entry '{}': {}", entry, err));
                }
            }
        }
    }
}

async fn expand_glob(
    site: &SiteConfig,
    client: &mut FetchClient,
    pattern: &str,
    set: &mut TargetSet,
    warnings: &mut Vec<String>,
) {
    let prefix = glob_prefix(pattern);
    let listing_url = match normalize(&site.base_url, &prefix) {
        Ok(url) => url,
        Err(err) => {
            warnings.push(format!(
                "skipping glob pattern '{}': bad prefix '{}': {}",
                pattern, prefix, err
            ));
            return;
        }
    };

    debug!(pattern, listing = %listing_url, "expanding glob pattern");

    let outcome = client.fetch(&listing_url).await;
    let body = match outcome.body {
        Some(body) if outcome.is_ok() => body,
        _ => {
            warnings.push(format!(
                "glob pattern '{}' produced no pages: fetching {} failed ({})",
                pattern,
                listing_url,
                outcome.status.as_str()
            ));
            return;
        }
    };

    let mut matched = 0usize;
    for link in extract_links(&body, &listing_url) {
        if !same_origin(&link, &site.base_url) {
            continue;
        }
        if matches_pattern(link.path(), pattern) {
            set.add(link, 0, Some(listing_url.clone()));
            matched += 1;
        }
    }

    if matched == 0 {
        warnings.push(format!(
            "glob pattern '{}' matched no links on {}",
            pattern, listing_url
        ));
    }
}

/// Directory prefix of a glob pattern up to the first wildcard
///
/// `/docs/*` fetches `/docs/`, `/blog/2024-*` fetches `/blog/`, a pattern
/// with no leading directory falls back to `/`.
fn glob_prefix(pattern: &str) -> String {
    let fixed = match pattern.find('*') {
        Some(idx) => &pattern[..idx],
        None => pattern,
    };

    match fixed.rfind('/') {
        Some(idx) => fixed[..=idx].to_string(),
        None => "/".to_string(),
    }
}
