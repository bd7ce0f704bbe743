//! wit: website in tree
//!
//! This crate scrapes websites into a versioned markdown file tree. Pages are
//! discovered (explicit lists, sitemaps, or a bounded crawl), fetched politely
//! with robots.txt compliance and retry/backoff, normalized to markdown, and
//! compared against the existing tree so only real changes produce writes.

pub mod config;
pub mod discovery;
pub mod extract;
pub mod fetch;
pub mod git;
pub mod markdown;
pub mod robots;
pub mod sync;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for wit operations
///
/// These are the run-fatal errors. Per-page failures (timeouts, missing
/// content, robots denials) are recorded as [`sync::PageFailure`] values and
/// never abort a run.
#[derive(Debug, Error)]
pub enum WitError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Path collision: {first} and {second} both map to {path}")]
    PathCollision {
        path: PathBuf,
        first: ::url::Url,
        second: ::url::Url,
    },

    #[error("Git error: {0}")]
    Git(#[from] git::GitError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for wit operations
pub type Result<T> = std::result::Result<T, WitError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, SiteConfig};
pub use discovery::PageTarget;
pub use fetch::{FetchClient, FetchOutcome, FetchStatus};
pub use sync::{PageFailure, SyncDecision, SyncReport};
pub use url::{normalize, same_origin};
