use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Per-origin rate limiter
///
/// Tracks the last request instant for each origin and sleeps whatever is
/// left of the configured delay before the next one. The effective delay
/// for an origin can only be raised, never lowered, so a robots.txt
/// crawl-delay larger than the configured one always wins.
#[derive(Debug)]
pub struct PolitenessClock {
    base_delay: Duration,
    overrides: HashMap<String, Duration>,
    last_request: HashMap<String, Instant>,
}

impl PolitenessClock {
    pub fn new(base_delay: Duration) -> Self {
        Self {
            base_delay,
            overrides: HashMap::new(),
            last_request: HashMap::new(),
        }
    }

    /// Rebuilds the clock with a new base delay, keeping per-origin
    /// overrides and request history
    pub fn rebase(self, base_delay: Duration) -> Self {
        Self { base_delay, ..self }
    }

    /// Raises the delay for an origin; ignored when not larger than the
    /// current effective delay
    pub fn raise_delay(&mut self, origin: &str, delay: Duration) {
        if delay > self.delay_for(origin) {
            self.overrides.insert(origin.to_string(), delay);
        }
    }

    /// Effective delay for an origin
    pub fn delay_for(&self, origin: &str) -> Duration {
        self.overrides
            .get(origin)
            .copied()
            .unwrap_or(self.base_delay)
            .max(self.base_delay)
    }

    /// Sleeps until the origin's delay has elapsed since its last request,
    /// then records this request
    pub async fn wait_turn(&mut self, origin: &str) {
        let delay = self.delay_for(origin);

        if let Some(last) = self.last_request.get(origin) {
            let elapsed = last.elapsed();
            if elapsed < delay {
                tokio::time::sleep(delay - elapsed).await;
            }
        }

        self.last_request.insert(origin.to_string(), Instant::now());
    }
}
