//! Polite HTTP fetching
//!
//! `FetchClient` is the run context for all network traffic: it owns the
//! HTTP client, the per-origin robots cache, the politeness clock, and an
//! optional render backend. Fetch failures are values, not errors; the
//! caller decides what a failed page means for the run.

mod backoff;
mod politeness;
mod render;

pub use backoff::Backoff;
pub use politeness::PolitenessClock;
pub use render::{RenderBackend, RenderError};

use crate::config::ScrapingConfig;
use crate::robots::{RobotsCache, RobotsPolicy};
use crate::url::origin_key;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Upper bound on any computed backoff delay
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Base delay for the first retry
const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Terminal classification of a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// 2xx with a body
    Ok,
    /// 404 or another non-retryable 4xx
    NotFound,
    /// 5xx or a connection failure, after retries
    ServerError,
    /// 429, after retries
    RateLimited,
    /// Request timed out, after retries
    Timeout,
    /// Rendering was required and failed
    RenderFailed,
    /// robots.txt disallows the URL; never fetched
    RobotsDisallowed,
}

impl FetchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStatus::Ok => "ok",
            FetchStatus::NotFound => "not found",
            FetchStatus::ServerError => "server error",
            FetchStatus::RateLimited => "rate limited",
            FetchStatus::Timeout => "timeout",
            FetchStatus::RenderFailed => "render failed",
            FetchStatus::RobotsDisallowed => "disallowed by robots.txt",
        }
    }
}

/// Result of fetching one URL
#[derive(Debug)]
pub struct FetchOutcome {
    pub status: FetchStatus,

    /// Response body; present only when `status` is `Ok`
    pub body: Option<String>,

    /// URL after redirects
    pub final_url: Url,

    /// Attempts actually made
    pub attempts: u32,
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool {
        self.status == FetchStatus::Ok
    }
}

/// HTTP client with robots compliance, per-origin rate limiting, and
/// bounded retries
pub struct FetchClient {
    http: reqwest::Client,
    scraping: ScrapingConfig,
    robots: RobotsCache,
    clock: PolitenessClock,
    render: Option<Box<dyn RenderBackend>>,
}

impl FetchClient {
    pub fn new(scraping: &ScrapingConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(scraping.user_agent.clone())
            .timeout(Duration::from_secs(scraping.timeout))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            http,
            scraping: scraping.clone(),
            robots: RobotsCache::new(),
            clock: PolitenessClock::new(Duration::from_secs_f64(scraping.delay)),
            render: None,
        })
    }

    /// Rebuilds the client for another site's settings
    ///
    /// The robots cache and per-origin request bookkeeping carry over, so
    /// an origin shared by several sites keeps one delay schedule for the
    /// whole run.
    pub fn for_site(self, scraping: &ScrapingConfig) -> Result<Self, reqwest::Error> {
        let mut next = Self::new(scraping)?;
        next.robots = self.robots;
        next.clock = self
            .clock
            .rebase(Duration::from_secs_f64(scraping.delay));
        next.render = self.render;
        Ok(next)
    }

    /// Injects a render backend for `javascript: true` sites
    pub fn with_render_backend(mut self, backend: Box<dyn RenderBackend>) -> Self {
        self.render = Some(backend);
        self
    }

    pub fn render_available(&self) -> bool {
        self.render.is_some()
    }

    /// Fetches a URL, honoring robots.txt, rate limits, and the retry budget
    pub async fn fetch(&mut self, url: &Url) -> FetchOutcome {
        if !self.robots_allows(url).await {
            debug!(url = %url, "skipping URL disallowed by robots.txt");
            return FetchOutcome {
                status: FetchStatus::RobotsDisallowed,
                body: None,
                final_url: url.clone(),
                attempts: 0,
            };
        }

        let outcome = self.fetch_static(url).await;

        if !self.scraping.javascript {
            return outcome;
        }

        let backend = match self.render.as_ref() {
            Some(backend) => backend,
            None => return outcome,
        };

        // Rendering counts as a request against the origin's rate limit
        self.clock.wait_turn(&origin_key(url)).await;

        let timeout = Duration::from_secs(self.scraping.timeout);
        match backend.render(url, timeout).await {
            Ok(html) => FetchOutcome {
                status: FetchStatus::Ok,
                body: Some(html),
                final_url: outcome.final_url,
                attempts: outcome.attempts,
            },
            Err(err) => {
                warn!(url = %url, error = %err, "render failed");
                if outcome.is_ok() {
                    // Fall back to the static HTML
                    outcome
                } else {
                    FetchOutcome {
                        status: FetchStatus::RenderFailed,
                        body: None,
                        final_url: outcome.final_url,
                        attempts: outcome.attempts,
                    }
                }
            }
        }
    }

    async fn fetch_static(&mut self, url: &Url) -> FetchOutcome {
        let origin = origin_key(url);
        let mut backoff = Backoff::new(self.scraping.retries, BACKOFF_BASE, MAX_BACKOFF);
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            self.clock.wait_turn(&origin).await;
            debug!(url = %url, attempt = attempts, "fetching");

            // A retryable failure yields its status and an optional
            // server-requested delay; everything else returns directly.
            let (failure, retry_after) = match self.http.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    let final_url = response.url().clone();

                    if status.is_success() {
                        match response.text().await {
                            Ok(body) => {
                                return FetchOutcome {
                                    status: FetchStatus::Ok,
                                    body: Some(body),
                                    final_url,
                                    attempts,
                                };
                            }
                            Err(err) => {
                                warn!(url = %url, error = %err, "failed to read response body");
                                (FetchStatus::ServerError, None)
                            }
                        }
                    } else if status == StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = parse_retry_after(response.headers());
                        (FetchStatus::RateLimited, retry_after)
                    } else if status.is_server_error() {
                        (FetchStatus::ServerError, None)
                    } else {
                        // 404 and other client errors are terminal
                        return FetchOutcome {
                            status: FetchStatus::NotFound,
                            body: None,
                            final_url,
                            attempts,
                        };
                    }
                }
                Err(err) => {
                    let status = if err.is_timeout() {
                        FetchStatus::Timeout
                    } else {
                        FetchStatus::ServerError
                    };
                    warn!(url = %url, error = %err, "request failed");
                    (status, None)
                }
            };

            match backoff.next_delay() {
                Some(delay) => {
                    let delay = retry_after.unwrap_or(delay).min(MAX_BACKOFF);
                    debug!(
                        url = %url,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        "retrying after {}",
                        failure.as_str()
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    warn!(url = %url, attempts, "giving up: {}", failure.as_str());
                    return FetchOutcome {
                        status: failure,
                        body: None,
                        final_url: url.clone(),
                        attempts,
                    };
                }
            }
        }
    }

    /// Checks robots.txt for the URL, fetching the origin's policy on first
    /// contact
    async fn robots_allows(&mut self, url: &Url) -> bool {
        let origin = origin_key(url);

        if !self.robots.has(&origin) {
            self.clock.wait_turn(&origin).await;
            let policy = self.fetch_robots(&origin).await;

            if let Some(delay) = policy.crawl_delay(&self.scraping.user_agent) {
                if delay.is_finite() && delay > 0.0 {
                    self.clock
                        .raise_delay(&origin, Duration::from_secs_f64(delay));
                }
            }

            self.robots.insert(origin.clone(), policy);
        }

        self.robots
            .get(&origin)
            .map(|policy| policy.is_allowed(url.as_str(), &self.scraping.user_agent))
            .unwrap_or(true)
    }

    async fn fetch_robots(&self, origin: &str) -> RobotsPolicy {
        let robots_url = format!("{}/robots.txt", origin);
        debug!(url = %robots_url, "fetching robots.txt");

        match self.http.get(robots_url.as_str()).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(content) => RobotsPolicy::from_content(&content),
                Err(err) => {
                    warn!(url = %robots_url, error = %err, "failed to read robots.txt body");
                    RobotsPolicy::allow_all()
                }
            },
            Ok(response) => {
                debug!(url = %robots_url, status = %response.status(), "no robots.txt");
                RobotsPolicy::allow_all()
            }
            Err(err) => {
                debug!(url = %robots_url, error = %err, "robots.txt unreachable");
                RobotsPolicy::allow_all()
            }
        }
    }
}

/// Parses an integer-seconds `Retry-After` header
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
