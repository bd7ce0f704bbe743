use crate::config::types::{Config, ScrapingConfig, SelectorConfig, SiteConfig};
use crate::ConfigError;
use scraper::Selector;

/// Validates a resolved configuration
///
/// `render_available` says whether a render backend has been injected;
/// without one, `javascript: true` is an error rather than a silent no-op.
pub fn validate(config: &Config, render_available: bool) -> Result<(), ConfigError> {
    if config.sites.is_empty() {
        return Err(ConfigError::Validation("No sites configured".to_string()));
    }

    for site in &config.sites {
        validate_site(site, render_available)?;
    }

    Ok(())
}

fn validate_site(site: &SiteConfig, render_available: bool) -> Result<(), ConfigError> {
    let scheme = site.base_url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url for site '{}' must use http or https, got '{}'",
            site.name, scheme
        )));
    }

    if site.base_url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url for site '{}' has no host",
            site.name
        )));
    }

    validate_selectors(&site.name, &site.selectors)?;
    validate_scraping(&site.name, &site.scraping, render_available)?;

    if let Some(crawl) = &site.pages.crawl {
        if crawl.max_pages == 0 {
            return Err(ConfigError::Validation(format!(
                "crawl.max_pages for site '{}' must be >= 1",
                site.name
            )));
        }
    }

    Ok(())
}

fn validate_selectors(site: &str, selectors: &SelectorConfig) -> Result<(), ConfigError> {
    let all = selectors
        .content
        .iter()
        .chain(selectors.remove.iter())
        .chain(selectors.title.iter());

    for raw in all {
        if Selector::parse(raw).is_err() {
            return Err(ConfigError::InvalidSelector(format!(
                "'{}' in site '{}'",
                raw, site
            )));
        }
    }

    Ok(())
}

fn validate_scraping(
    site: &str,
    scraping: &ScrapingConfig,
    render_available: bool,
) -> Result<(), ConfigError> {
    if !scraping.delay.is_finite() || scraping.delay < 0.0 {
        return Err(ConfigError::Validation(format!(
            "scraping.delay for site '{}' must be a non-negative number, got {}",
            site, scraping.delay
        )));
    }

    if scraping.timeout == 0 {
        return Err(ConfigError::Validation(format!(
            "scraping.timeout for site '{}' must be >= 1 second",
            site
        )));
    }

    if scraping.retries == 0 {
        return Err(ConfigError::Validation(format!(
            "scraping.retries for site '{}' must be >= 1",
            site
        )));
    }

    if scraping.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "scraping.user_agent for site '{}' cannot be empty",
            site
        )));
    }

    if scraping.javascript && !render_available {
        return Err(ConfigError::Validation(format!(
            "site '{}' requests javascript rendering but no render backend is available",
            site
        )));
    }

    Ok(())
}
