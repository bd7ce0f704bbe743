//! URL canonicalization and path pattern matching
//!
//! Normalized URLs are the identity used for deduplication everywhere in the
//! pipeline: two URLs refer to the same page iff they normalize equal.

mod matcher;
mod normalize;

pub use matcher::{matches_pattern, should_include};
pub use normalize::normalize;

use url::Url;

/// Checks whether two URLs share an origin (scheme, host, port)
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// Returns the origin of a URL as a cache/clock key, e.g. `https://example.com`
pub fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_origin() {
        let a = Url::parse("https://example.com/a").unwrap();
        let b = Url::parse("https://example.com/b?q=1").unwrap();
        assert!(same_origin(&a, &b));
    }

    #[test]
    fn test_different_host() {
        let a = Url::parse("https://example.com/").unwrap();
        let b = Url::parse("https://other.com/").unwrap();
        assert!(!same_origin(&a, &b));
    }

    #[test]
    fn test_different_scheme() {
        let a = Url::parse("http://example.com/").unwrap();
        let b = Url::parse("https://example.com/").unwrap();
        assert!(!same_origin(&a, &b));
    }

    #[test]
    fn test_origin_key() {
        let url = Url::parse("https://example.com:8443/page").unwrap();
        assert_eq!(origin_key(&url), "https://example.com:8443");
    }

    #[test]
    fn test_origin_key_default_port() {
        let url = Url::parse("https://example.com:443/page").unwrap();
        assert_eq!(origin_key(&url), "https://example.com");
    }
}
