use crate::UrlError;
use url::Url;

/// Normalizes a raw link into a canonical absolute URL
///
/// # Normalization Steps
///
/// 1. Resolve relative references against `base`
/// 2. Reject anything that is not HTTP or HTTPS
/// 3. Lowercase scheme and host, drop default ports (the `url` crate does
///    this on parse)
/// 4. Collapse duplicate slashes in the path
/// 5. Remove the fragment
///
/// Query strings and trailing slashes are preserved: `/about` and `/about/`
/// are distinct resources and map to distinct files.
///
/// # Arguments
///
/// * `base` - The site base URL that relative references resolve against
/// * `raw` - The link as found in config, HTML, or a sitemap
///
/// # Examples
///
/// ```
/// use url::Url;
/// use wit::url::normalize;
///
/// let base = Url::parse("https://example.com").unwrap();
/// let url = normalize(&base, "/a//b#section").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/a/b");
/// ```
pub fn normalize(base: &Url, raw: &str) -> Result<Url, UrlError> {
    let raw = raw.trim();

    let mut url = if raw.starts_with("http://") || raw.starts_with("https://") {
        Url::parse(raw).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?
    } else {
        base.join(raw)
            .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    let path = url.path();
    if path.contains("//") {
        let collapsed = collapse_slashes(path);
        url.set_path(&collapsed);
    }

    url.set_fragment(None);

    Ok(url)
}

/// Collapses runs of slashes in a path, preserving any trailing slash
fn collapse_slashes(path: &str) -> String {
    let trailing = path.len() > 1 && path.ends_with('/');
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.is_empty() {
        return "/".to_string();
    }

    let mut result = format!("/{}", segments.join("/"));
    if trailing {
        result.push('/');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com").unwrap()
    }

    #[test]
    fn test_absolute_path() {
        let url = normalize(&base(), "/about").unwrap();
        assert_eq!(url.as_str(), "https://example.com/about");
    }

    #[test]
    fn test_already_absolute() {
        let url = normalize(&base(), "https://example.com/docs").unwrap();
        assert_eq!(url.as_str(), "https://example.com/docs");
    }

    #[test]
    fn test_relative_without_slash() {
        let base = Url::parse("https://example.com/docs/intro").unwrap();
        let url = normalize(&base, "setup").unwrap();
        assert_eq!(url.as_str(), "https://example.com/docs/setup");
    }

    #[test]
    fn test_strip_fragment() {
        let url = normalize(&base(), "/page#section").unwrap();
        assert_eq!(url.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_lowercase_host() {
        let url = normalize(&base(), "https://EXAMPLE.COM/Page").unwrap();
        assert_eq!(url.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_remove_default_port() {
        let url = normalize(&base(), "https://example.com:443/page").unwrap();
        assert_eq!(url.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_keep_explicit_port() {
        let url = normalize(&base(), "http://example.com:8080/page").unwrap();
        assert_eq!(url.as_str(), "http://example.com:8080/page");
    }

    #[test]
    fn test_collapse_duplicate_slashes() {
        let url = normalize(&base(), "/a//b///c").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a/b/c");
    }

    #[test]
    fn test_preserve_trailing_slash() {
        let url = normalize(&base(), "/docs/").unwrap();
        assert_eq!(url.as_str(), "https://example.com/docs/");
    }

    #[test]
    fn test_preserve_query() {
        let url = normalize(&base(), "/search?q=rust&page=2").unwrap();
        assert_eq!(url.as_str(), "https://example.com/search?q=rust&page=2");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize(&base(), "ftp://example.com/file");
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_mailto_rejected() {
        // base.join resolves mailto: as an opaque URL with no host
        let result = normalize(&base(), "mailto:a@example.com");
        assert!(result.is_err());
    }

    #[test]
    fn test_dedup_equality() {
        let a = normalize(&base(), "https://EXAMPLE.com:443/x//y#frag").unwrap();
        let b = normalize(&base(), "/x/y").unwrap();
        assert_eq!(a, b);
    }
}
