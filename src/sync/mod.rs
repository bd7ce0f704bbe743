//! The sync engine
//!
//! Runs a site through the full pipeline: discover pages, map them to file
//! paths (failing fast on collisions), fetch and extract each one, and
//! compare the rendered document against whatever is on disk. The engine
//! only reads the tree; writing is a separate, explicit step so a run can
//! be inspected before it touches anything.

mod paths;

pub use paths::map_path;

use crate::config::SiteConfig;
use crate::discovery::{discover, PageTarget};
use crate::extract::extract_page;
use crate::fetch::{FetchClient, FetchStatus};
use crate::markdown::{comparison_basis, render_document};
use crate::{Result, WitError};
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info};
use url::Url;

/// What a run decided about one page
#[derive(Debug)]
pub struct SyncDecision {
    pub url: Url,
    pub path: PathBuf,

    /// Full rendered document, frontmatter included
    pub content: String,

    /// Whether the page differs from the file on disk, timestamp aside
    pub changed: bool,

    /// Existing file content, when the file was present
    pub previous: Option<String>,
}

/// Why one page produced no decision
#[derive(Debug, Clone)]
pub struct PageFailure {
    pub url: Url,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The fetch ended in a non-ok terminal status
    Fetch(FetchStatus),

    /// The page was fetched but no content selector matched
    NoContent,
}

/// Outcome of syncing one site
#[derive(Debug, Default)]
pub struct SyncReport {
    pub site: String,
    pub decisions: Vec<SyncDecision>,
    pub failures: Vec<PageFailure>,
    pub warnings: Vec<String>,
}

impl SyncReport {
    pub fn changed(&self) -> impl Iterator<Item = &SyncDecision> {
        self.decisions.iter().filter(|d| d.changed)
    }

    pub fn changed_count(&self) -> usize {
        self.changed().count()
    }
}

/// Syncs one site, without writing anything
///
/// Per-page problems become [`PageFailure`] entries; only configuration
/// level problems (a path collision, an unreadable existing file) abort.
pub async fn sync_site(site: &SiteConfig, client: &mut FetchClient) -> Result<SyncReport> {
    info!(site = %site.name, base_url = %site.base_url, "syncing site");

    let discovery = discover(site, client).await;
    let targets = assign_paths(site, discovery.targets)?;

    let mut decisions = Vec::new();
    let mut failures = Vec::new();

    for (target, path) in targets {
        match sync_page(site, client, &target, path).await? {
            Ok(decision) => {
                debug!(
                    url = %decision.url,
                    path = %decision.path.display(),
                    changed = decision.changed,
                    "page synced"
                );
                decisions.push(decision);
            }
            Err(failure) => {
                info!(url = %failure.url, "page skipped: {}", failure.message);
                failures.push(failure);
            }
        }
    }

    info!(
        site = %site.name,
        pages = decisions.len(),
        changed = decisions.iter().filter(|d| d.changed).count(),
        failed = failures.len(),
        "sync complete"
    );

    Ok(SyncReport {
        site: site.name.clone(),
        decisions,
        failures,
        warnings: discovery.warnings,
    })
}

/// Maps every target to a file path, rejecting collisions before any page
/// is fetched
fn assign_paths(
    site: &SiteConfig,
    targets: Vec<PageTarget>,
) -> Result<Vec<(PageTarget, PathBuf)>> {
    let mut claimed: HashMap<PathBuf, Url> = HashMap::new();
    let mut assigned = Vec::with_capacity(targets.len());

    for target in targets {
        let path = map_path(&target.url, &site.base_url, &site.output_dir);

        if let Some(first) = claimed.get(&path) {
            return Err(WitError::PathCollision {
                path,
                first: first.clone(),
                second: target.url,
            });
        }

        claimed.insert(path.clone(), target.url.clone());
        assigned.push((target, path));
    }

    Ok(assigned)
}

async fn sync_page(
    site: &SiteConfig,
    client: &mut FetchClient,
    target: &PageTarget,
    path: PathBuf,
) -> Result<std::result::Result<SyncDecision, PageFailure>> {
    let outcome = client.fetch(&target.url).await;

    let body = match outcome.body {
        Some(body) if outcome.is_ok() => body,
        _ => {
            return Ok(Err(PageFailure {
                url: target.url.clone(),
                kind: FailureKind::Fetch(outcome.status),
                message: format!(
                    "fetch failed after {} attempt(s): {}",
                    outcome.attempts,
                    outcome.status.as_str()
                ),
            }));
        }
    };

    let page = match extract_page(&body, &site.selectors, &site.markdown) {
        Ok(page) => page,
        Err(err) => {
            return Ok(Err(PageFailure {
                url: target.url.clone(),
                kind: FailureKind::NoContent,
                message: err.to_string(),
            }));
        }
    };

    let content = render_document(
        &page.markdown,
        &target.url,
        page.title.as_deref(),
        &site.metadata,
        Utc::now(),
    );

    let previous = match fs::read_to_string(&path) {
        Ok(existing) => Some(existing),
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => return Err(err.into()),
    };

    let changed = match &previous {
        Some(existing) => comparison_basis(existing) != comparison_basis(&content),
        None => true,
    };

    Ok(Ok(SyncDecision {
        url: target.url.clone(),
        path,
        content,
        changed,
        previous,
    }))
}

/// Writes every changed decision to disk, creating parent directories
///
/// Returns the paths written, in decision order.
pub fn write_changes(report: &SyncReport) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for decision in report.changed() {
        if let Some(parent) = decision.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&decision.path, &decision.content)?;
        debug!(path = %decision.path.display(), "wrote page");
        written.push(decision.path.clone());
    }

    Ok(written)
}
