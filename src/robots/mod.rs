//! Robots.txt policy handling
//!
//! Policies are cached per origin for the duration of one run. The cache is
//! owned by the fetch client (an explicit run context), never shared across
//! runs, so runs stay independently testable.

use chrono::{DateTime, Utc};
use robotstxt::DefaultMatcher;
use std::collections::HashMap;

/// Parsed robots.txt policy for one origin
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    /// Raw robots.txt content (empty means allow all)
    content: String,

    /// Skip matching entirely and allow everything
    allow_all: bool,

    /// When the policy was fetched
    pub fetched_at: DateTime<Utc>,
}

impl RobotsPolicy {
    /// Creates a policy from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
            fetched_at: Utc::now(),
        }
    }

    /// Creates a permissive policy that allows everything
    ///
    /// Used when robots.txt cannot be fetched: an unreachable or missing
    /// robots.txt is treated as no restrictions.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if a URL is allowed for the given user agent
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Gets the crawl delay in seconds for a specific user agent
    ///
    /// The robotstxt crate does not expose Crawl-delay, so the directive is
    /// parsed by hand. A delay applies to the preceding User-agent group;
    /// an agent-specific delay wins over the wildcard one.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.allow_all || self.content.is_empty() {
            return None;
        }

        let mut current_agents: Vec<String> = Vec::new();
        let mut wildcard_delay: Option<f64> = None;
        let mut agent_delay: Option<f64> = None;

        let normalized_agent = user_agent.to_lowercase();

        for line in self.content.lines() {
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = trimmed.split_once(':') {
                let key = key.trim().to_lowercase();
                let value = value.trim();

                match key.as_str() {
                    "user-agent" => {
                        current_agents.push(value.to_lowercase());
                    }
                    "crawl-delay" => {
                        if let Ok(delay) = value.parse::<f64>() {
                            if current_agents
                                .iter()
                                .any(|ua| ua == "*" || normalized_agent.contains(ua))
                            {
                                if current_agents.iter().any(|ua| ua == "*") {
                                    wildcard_delay = Some(delay);
                                } else {
                                    agent_delay = Some(delay);
                                }
                            }
                        }
                        current_agents.clear();
                    }
                    _ => {}
                }
            }
        }

        agent_delay.or(wildcard_delay)
    }
}

/// Per-origin robots policy cache, scoped to one run
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: HashMap<String, RobotsPolicy>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a policy for the origin has been fetched already
    pub fn has(&self, origin: &str) -> bool {
        self.entries.contains_key(origin)
    }

    pub fn insert(&mut self, origin: String, policy: RobotsPolicy) {
        self.entries.insert(origin, policy);
    }

    pub fn get(&self, origin: &str) -> Option<&RobotsPolicy> {
        self.entries.get(origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let policy = RobotsPolicy::allow_all();
        assert!(policy.is_allowed("https://example.com/any", "TestBot"));
        assert!(policy.is_allowed("https://example.com/admin", "TestBot"));
    }

    #[test]
    fn test_empty_content_allows() {
        let policy = RobotsPolicy::from_content("");
        assert!(policy.is_allowed("https://example.com/page", "TestBot"));
    }

    #[test]
    fn test_disallow_all() {
        let policy = RobotsPolicy::from_content("User-agent: *\nDisallow: /");
        assert!(!policy.is_allowed("https://example.com/", "TestBot"));
        assert!(!policy.is_allowed("https://example.com/page", "TestBot"));
    }

    #[test]
    fn test_disallow_prefix() {
        let policy = RobotsPolicy::from_content("User-agent: *\nDisallow: /admin");
        assert!(policy.is_allowed("https://example.com/page", "TestBot"));
        assert!(!policy.is_allowed("https://example.com/admin", "TestBot"));
        assert!(!policy.is_allowed("https://example.com/admin/users", "TestBot"));
    }

    #[test]
    fn test_allow_overrides_disallow() {
        let policy =
            RobotsPolicy::from_content("User-agent: *\nDisallow: /private\nAllow: /private/public");
        assert!(!policy.is_allowed("https://example.com/private", "TestBot"));
        assert!(policy.is_allowed("https://example.com/private/public", "TestBot"));
    }

    #[test]
    fn test_specific_user_agent() {
        let policy =
            RobotsPolicy::from_content("User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /");
        assert!(policy.is_allowed("https://example.com/page", "GoodBot"));
        assert!(!policy.is_allowed("https://example.com/page", "BadBot"));
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let policy = RobotsPolicy::from_content("User-agent: *\nCrawl-delay: 10\nDisallow: /admin");
        assert_eq!(policy.crawl_delay("TestBot"), Some(10.0));
        assert_eq!(policy.crawl_delay("AnyBot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_specific_agent_wins() {
        let policy = RobotsPolicy::from_content(
            "User-agent: TestBot\nCrawl-delay: 5\n\nUser-agent: *\nCrawl-delay: 10",
        );
        assert_eq!(policy.crawl_delay("TestBot"), Some(5.0));
        assert_eq!(policy.crawl_delay("OtherBot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_absent() {
        let policy = RobotsPolicy::from_content("User-agent: *\nDisallow: /admin");
        assert_eq!(policy.crawl_delay("TestBot"), None);
    }

    #[test]
    fn test_crawl_delay_decimal() {
        let policy = RobotsPolicy::from_content("User-agent: *\nCrawl-delay: 2.5");
        assert_eq!(policy.crawl_delay("TestBot"), Some(2.5));
    }

    #[test]
    fn test_cache_roundtrip() {
        let mut cache = RobotsCache::new();
        assert!(!cache.has("https://example.com"));

        cache.insert(
            "https://example.com".to_string(),
            RobotsPolicy::from_content("User-agent: *\nDisallow: /admin"),
        );

        assert!(cache.has("https://example.com"));
        let policy = cache.get("https://example.com").unwrap();
        assert!(!policy.is_allowed("https://example.com/admin", "TestBot"));
    }
}
