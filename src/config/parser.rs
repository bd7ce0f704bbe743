use crate::config::types::{Config, RawConfig, RawSite, SiteConfig};
use crate::ConfigError;
use std::path::{Path, PathBuf};
use url::Url;

/// Loads a configuration file and resolves it
///
/// Supports two formats:
/// 1. Multi-site: a `sites:` list, with top-level sections acting as
///    defaults shared by every site
/// 2. Single-site (legacy): a top-level `base_url` with the other settings
///    alongside it
///
/// Structural validation (selector syntax, bounds, render availability) is
/// separate; see [`crate::config::validate`].
///
/// # Arguments
///
/// * `path` - Path to the YAML configuration file
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let raw: RawConfig = serde_yaml::from_str(&content)?;
    resolve(raw)
}

/// Resolves a raw (partial) configuration into a fully defaulted one
fn resolve(raw: RawConfig) -> Result<Config, ConfigError> {
    let git = raw.git.clone().unwrap_or_default().resolve();

    if let Some(sites) = raw.sites.clone() {
        if sites.is_empty() {
            return Err(ConfigError::Validation(
                "'sites' list cannot be empty".to_string(),
            ));
        }

        let mut resolved = Vec::with_capacity(sites.len());
        let mut seen_names: Vec<String> = Vec::new();

        for site in sites {
            let site = resolve_site(site, &raw)?;

            if seen_names.contains(&site.name) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate site name: '{}'. Use an explicit 'name' field to disambiguate",
                    site.name
                )));
            }
            seen_names.push(site.name.clone());
            resolved.push(site);
        }

        return Ok(Config {
            sites: resolved,
            git,
        });
    }

    // Legacy single-site format
    let base_url = raw.base_url.clone().ok_or_else(|| {
        ConfigError::Validation("Configuration must include 'base_url' or 'sites'".to_string())
    })?;

    let base_url = parse_base_url(&base_url)?;
    let name = derive_site_name(&base_url);
    let output_dir = raw
        .output_dir
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("content"));

    Ok(Config {
        sites: vec![SiteConfig {
            name,
            base_url,
            output_dir,
            pages: raw.pages.unwrap_or_default(),
            selectors: raw.selectors.unwrap_or_default().resolve(),
            scraping: raw.scraping.unwrap_or_default().resolve(),
            markdown: raw.markdown.unwrap_or_default().resolve(),
            metadata: raw.metadata.unwrap_or_default().resolve(),
        }],
        git,
    })
}

/// Resolves one site entry, layering its sections over the globals
fn resolve_site(site: RawSite, globals: &RawConfig) -> Result<SiteConfig, ConfigError> {
    let base_url = parse_base_url(&site.base_url)?;

    let name = site
        .name
        .clone()
        .unwrap_or_else(|| derive_site_name(&base_url));

    let output_dir = site
        .output_dir
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("content").join(&name));

    let selectors = site
        .selectors
        .unwrap_or_default()
        .merge_over(globals.selectors.clone().unwrap_or_default());
    let scraping = site
        .scraping
        .unwrap_or_default()
        .merge_over(globals.scraping.clone().unwrap_or_default());
    let markdown = site
        .markdown
        .unwrap_or_default()
        .merge_over(globals.markdown.clone().unwrap_or_default());
    let metadata = site
        .metadata
        .unwrap_or_default()
        .merge_over(globals.metadata.clone().unwrap_or_default());

    Ok(SiteConfig {
        name,
        base_url,
        output_dir,
        pages: site.pages.unwrap_or_default(),
        selectors: selectors.resolve(),
        scraping: scraping.resolve(),
        markdown: markdown.resolve(),
        metadata: metadata.resolve(),
    })
}

/// Parses a base URL, trimming any trailing slash first
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim_end_matches('/');
    Url::parse(trimmed).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", raw, e)))
}

/// Derives a site name from the base URL host
///
/// `docs.example.com` becomes `docs-example`; `example.com` becomes
/// `example`. Hosts without dots are used verbatim.
pub fn derive_site_name(base_url: &Url) -> String {
    let host = base_url.host_str().unwrap_or("site");
    let parts: Vec<&str> = host.split('.').collect();

    if parts.len() > 2 {
        parts[..parts.len() - 1].join("-")
    } else if parts.len() == 2 {
        parts[0].to_string()
    } else {
        host.to_string()
    }
}

/// Generates a default config file as a YAML string
pub fn create_default_config(base_url: &str, multi_site: bool) -> String {
    if multi_site {
        create_multi_site_config(base_url)
    } else {
        create_single_site_config(base_url)
    }
}

fn create_single_site_config(base_url: &str) -> String {
    format!(
        r##"# wit configuration file
# Website in tree - scrape websites to markdown

# Required: base URL of the website
base_url: {base_url}

# Output directory for markdown files
output_dir: content

# How to discover pages (choose one or combine)
pages:
  # Option 1: explicit list of URLs
  urls:
    - /
    - /about

  # Option 2: sitemap (uncomment to use)
  # sitemap: /sitemap.xml

  # Option 3: crawl from start page (uncomment to use)
  # crawl:
  #   start: /
  #   max_depth: 2
  #   max_pages: 50
  #   include:
  #     - /docs/*
  #   exclude:
  #     - /admin/*

# Content extraction selectors
selectors:
  # Main content (first match wins)
  content:
    - main
    - article
    - .content
    - "#main-content"
    - body

  # Elements to remove before conversion
  remove:
    - nav
    - footer
    - header
    - script
    - style
    - noscript

  # Title selector
  title: h1

# Scraping behavior
scraping:
  delay: 1.0              # seconds between requests
  timeout: 30             # request timeout in seconds
  user_agent: "wit/1.0"   # custom user agent
  javascript: false       # render pages with a JS backend
  retries: 3              # total fetch attempts

# Markdown conversion options
markdown:
  heading_style: atx      # atx (#) or setext (underline)
  strip_links: false      # remove hyperlinks
  include_images: true    # include image references
  code_language: auto     # try to detect code block languages

# Git commit settings (used with --commit)
git:
  author_name: wit[bot]
  author_email: wit[bot]@users.noreply.github.com
  message_template: "Update {{changed_count}} page(s): {{changed_files}}"

# Metadata to include in markdown frontmatter
metadata:
  include_source_url: true
  include_timestamp: true
  include_title: true
"##
    )
}

fn create_multi_site_config(base_url: &str) -> String {
    let name = Url::parse(base_url.trim_end_matches('/'))
        .map(|u| derive_site_name(&u))
        .unwrap_or_else(|_| "site".to_string());

    format!(
        r##"# wit configuration file - multi-site
# Website in tree - scrape multiple websites to markdown

sites:
  - name: {name}  # optional: derived from URL if not specified
    base_url: {base_url}
    output_dir: content/{name}  # each site gets its own directory
    pages:
      urls:
        - /
        - /about

  # Example: add more sites
  # - name: docs
  #   base_url: https://docs.example.com
  #   pages:
  #     sitemap: /sitemap.xml

# Global settings (apply to all sites unless overridden)
selectors:
  content:
    - main
    - article
    - .content
    - "#main-content"
    - body
  remove:
    - nav
    - footer
    - header
    - script
    - style
  title: h1

scraping:
  delay: 1.0
  timeout: 30
  user_agent: "wit/1.0"
  javascript: false

markdown:
  heading_style: atx
  strip_links: false
  include_images: true

metadata:
  include_source_url: true
  include_timestamp: true
  include_title: true

git:
  author_name: wit[bot]
  author_email: wit[bot]@users.noreply.github.com
  message_template: "Update {{changed_count}} page(s): {{changed_files}}"
"##
    )
}
