use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

/// Fully resolved configuration: every default applied, every URL parsed
#[derive(Debug, Clone)]
pub struct Config {
    pub sites: Vec<SiteConfig>,
    pub git: GitConfig,
}

impl Config {
    /// Gets a site by name
    pub fn get_site(&self, name: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|s| s.name == name)
    }

    /// Gets sites, optionally filtered by name
    pub fn get_sites(&self, names: Option<&[String]>) -> Vec<&SiteConfig> {
        match names {
            None => self.sites.iter().collect(),
            Some(names) => self
                .sites
                .iter()
                .filter(|s| names.iter().any(|n| n == &s.name))
                .collect(),
        }
    }

    /// All configured site names
    pub fn site_names(&self) -> Vec<&str> {
        self.sites.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Configuration for a single site
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Site name, derived from the host when not given explicitly
    pub name: String,

    /// Base URL all relative paths resolve against
    pub base_url: Url,

    /// Directory the markdown tree is written under
    pub output_dir: PathBuf,

    pub pages: PagesConfig,
    pub selectors: SelectorConfig,
    pub scraping: ScrapingConfig,
    pub markdown: MarkdownConfig,
    pub metadata: MetadataConfig,
}

/// Page discovery configuration; the modes are combinable
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PagesConfig {
    /// Explicit paths; entries containing `*` are expanded via link collection
    #[serde(default)]
    pub urls: Vec<String>,

    /// Sitemap path, e.g. `/sitemap.xml`
    #[serde(default)]
    pub sitemap: Option<String>,

    /// Breadth-first crawl settings
    #[serde(default)]
    pub crawl: Option<CrawlConfig>,
}

impl PagesConfig {
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.sitemap.is_none() && self.crawl.is_none()
    }
}

/// Crawl traversal bounds and filters
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Starting path
    #[serde(default = "default_crawl_start")]
    pub start: String,

    /// Maximum link depth followed from the start page
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Cap on the number of discovered pages
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Path patterns a link must match (empty = match all)
    #[serde(default)]
    pub include: Vec<String>,

    /// Path patterns that reject a link
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start: default_crawl_start(),
            max_depth: default_max_depth(),
            max_pages: default_max_pages(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

fn default_crawl_start() -> String {
    "/".to_string()
}

fn default_max_depth() -> u32 {
    2
}

fn default_max_pages() -> usize {
    50
}

/// Content extraction selectors
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Content selectors tried in order; first with a match wins
    pub content: Vec<String>,

    /// Elements removed before extraction
    pub remove: Vec<String>,

    /// Title selector; the document `<title>` is the fallback
    pub title: Option<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            content: ["main", "article", ".content", "#main-content", "body"]
                .map(String::from)
                .to_vec(),
            remove: ["nav", "footer", "header", "script", "style", "noscript"]
                .map(String::from)
                .to_vec(),
            title: Some("h1".to_string()),
        }
    }
}

/// Scraping behavior knobs
#[derive(Debug, Clone)]
pub struct ScrapingConfig {
    /// Minimum delay between requests to the same origin, in seconds
    pub delay: f64,

    /// Request timeout in seconds
    pub timeout: u64,

    /// User agent string sent with every request
    pub user_agent: String,

    /// Render pages with a JavaScript backend
    pub javascript: bool,

    /// Total fetch attempts for retryable failures
    pub retries: u32,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            delay: 1.0,
            timeout: 30,
            user_agent: "wit/1.0".to_string(),
            javascript: false,
            retries: 3,
        }
    }
}

/// Markdown heading rendering style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingStyle {
    /// `# Heading`
    Atx,
    /// Underlined with `===` / `---` (levels 1 and 2; deeper levels fall
    /// back to atx)
    Setext,
}

/// Code block language tagging policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageDetection {
    /// Use class hints, then best-effort pattern detection
    Auto,
    /// Use class hints only
    None,
}

/// Markdown conversion options
#[derive(Debug, Clone)]
pub struct MarkdownConfig {
    pub heading_style: HeadingStyle,
    pub strip_links: bool,
    pub include_images: bool,
    pub code_language: LanguageDetection,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            heading_style: HeadingStyle::Atx,
            strip_links: false,
            include_images: true,
            code_language: LanguageDetection::Auto,
        }
    }
}

/// Frontmatter field toggles
#[derive(Debug, Clone)]
pub struct MetadataConfig {
    pub include_source_url: bool,
    pub include_timestamp: bool,
    pub include_title: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            include_source_url: true,
            include_timestamp: true,
            include_title: true,
        }
    }
}

/// Git commit settings, used when a run is asked to commit
#[derive(Debug, Clone)]
pub struct GitConfig {
    pub author_name: String,
    pub author_email: String,

    /// Template with `{changed_count}` and `{changed_files}` placeholders
    pub message_template: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            author_name: "wit[bot]".to_string(),
            author_email: "wit[bot]@users.noreply.github.com".to_string(),
            message_template: "Update {changed_count} page(s): {changed_files}".to_string(),
        }
    }
}

// Raw (partial) deserialization targets. Every field is optional so that a
// site section can override just the keys it cares about; `merge_over` layers
// site values over globals before defaults fill the rest.

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawConfig {
    pub sites: Option<Vec<RawSite>>,
    pub git: Option<RawGit>,

    // Globals shared by every site (and the legacy single-site fields)
    pub base_url: Option<String>,
    pub output_dir: Option<String>,
    pub pages: Option<PagesConfig>,
    pub selectors: Option<RawSelectors>,
    pub scraping: Option<RawScraping>,
    pub markdown: Option<RawMarkdown>,
    pub metadata: Option<RawMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawSite {
    pub name: Option<String>,
    pub base_url: String,
    pub output_dir: Option<String>,
    pub pages: Option<PagesConfig>,
    pub selectors: Option<RawSelectors>,
    pub scraping: Option<RawScraping>,
    pub markdown: Option<RawMarkdown>,
    pub metadata: Option<RawMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawSelectors {
    pub content: Option<Vec<String>>,
    pub remove: Option<Vec<String>>,
    pub title: Option<String>,
}

impl RawSelectors {
    pub(crate) fn merge_over(self, base: Self) -> Self {
        Self {
            content: self.content.or(base.content),
            remove: self.remove.or(base.remove),
            title: self.title.or(base.title),
        }
    }

    pub(crate) fn resolve(self) -> SelectorConfig {
        let defaults = SelectorConfig::default();
        SelectorConfig {
            content: self.content.unwrap_or(defaults.content),
            remove: self.remove.unwrap_or(defaults.remove),
            title: self.title.map(Some).unwrap_or(defaults.title),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawScraping {
    pub delay: Option<f64>,
    pub timeout: Option<u64>,
    pub user_agent: Option<String>,
    pub javascript: Option<bool>,
    pub retries: Option<u32>,
}

impl RawScraping {
    pub(crate) fn merge_over(self, base: Self) -> Self {
        Self {
            delay: self.delay.or(base.delay),
            timeout: self.timeout.or(base.timeout),
            user_agent: self.user_agent.or(base.user_agent),
            javascript: self.javascript.or(base.javascript),
            retries: self.retries.or(base.retries),
        }
    }

    pub(crate) fn resolve(self) -> ScrapingConfig {
        let defaults = ScrapingConfig::default();
        ScrapingConfig {
            delay: self.delay.unwrap_or(defaults.delay),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            javascript: self.javascript.unwrap_or(defaults.javascript),
            retries: self.retries.unwrap_or(defaults.retries),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawMarkdown {
    pub heading_style: Option<HeadingStyle>,
    pub strip_links: Option<bool>,
    pub include_images: Option<bool>,
    pub code_language: Option<LanguageDetection>,
}

impl RawMarkdown {
    pub(crate) fn merge_over(self, base: Self) -> Self {
        Self {
            heading_style: self.heading_style.or(base.heading_style),
            strip_links: self.strip_links.or(base.strip_links),
            include_images: self.include_images.or(base.include_images),
            code_language: self.code_language.or(base.code_language),
        }
    }

    pub(crate) fn resolve(self) -> MarkdownConfig {
        let defaults = MarkdownConfig::default();
        MarkdownConfig {
            heading_style: self.heading_style.unwrap_or(defaults.heading_style),
            strip_links: self.strip_links.unwrap_or(defaults.strip_links),
            include_images: self.include_images.unwrap_or(defaults.include_images),
            code_language: self.code_language.unwrap_or(defaults.code_language),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawMetadata {
    pub include_source_url: Option<bool>,
    pub include_timestamp: Option<bool>,
    pub include_title: Option<bool>,
}

impl RawMetadata {
    pub(crate) fn merge_over(self, base: Self) -> Self {
        Self {
            include_source_url: self.include_source_url.or(base.include_source_url),
            include_timestamp: self.include_timestamp.or(base.include_timestamp),
            include_title: self.include_title.or(base.include_title),
        }
    }

    pub(crate) fn resolve(self) -> MetadataConfig {
        let defaults = MetadataConfig::default();
        MetadataConfig {
            include_source_url: self.include_source_url.unwrap_or(defaults.include_source_url),
            include_timestamp: self.include_timestamp.unwrap_or(defaults.include_timestamp),
            include_title: self.include_title.unwrap_or(defaults.include_title),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawGit {
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub message_template: Option<String>,
}

impl RawGit {
    pub(crate) fn resolve(self) -> GitConfig {
        let defaults = GitConfig::default();
        GitConfig {
            author_name: self.author_name.unwrap_or(defaults.author_name),
            author_email: self.author_email.unwrap_or(defaults.author_email),
            message_template: self.message_template.unwrap_or(defaults.message_template),
        }
    }
}
