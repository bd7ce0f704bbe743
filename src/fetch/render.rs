use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors a render backend can report
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render timed out after {0:?}")]
    Timeout(Duration),

    #[error("render failed: {0}")]
    Failed(String),
}

/// A JavaScript rendering backend
///
/// The core pipeline never drives a browser itself; callers that need
/// rendered pages inject an implementation of this trait. When none is
/// injected, configurations with `javascript: true` fail validation.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Renders a page and returns the post-JavaScript HTML
    async fn render(&self, url: &Url, timeout: Duration) -> Result<String, RenderError>;
}
