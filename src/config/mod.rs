//! Configuration loading, defaults, and validation
//!
//! Configuration is a YAML file (`wit.yaml` by convention) in one of two
//! forms: a multi-site document with a `sites:` list, or the legacy
//! single-site form with a top-level `base_url`. Global `selectors`,
//! `scraping`, `markdown`, and `metadata` sections apply to every site
//! unless the site overrides them.

mod parser;
mod types;
mod validation;

pub use parser::{create_default_config, derive_site_name, load_config};
pub use types::{
    Config, CrawlConfig, GitConfig, HeadingStyle, LanguageDetection, MarkdownConfig,
    MetadataConfig, PagesConfig, ScrapingConfig, SelectorConfig, SiteConfig,
};
pub use validation::validate;
