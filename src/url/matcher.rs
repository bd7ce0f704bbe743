use regex::Regex;

/// Checks if a URL path matches a glob-like pattern
///
/// Patterns are anchored and support `*` as "any run of characters":
/// `/blog/*` matches `/blog/post` and `/blog/2024/post` but not `/about`.
/// All other characters match literally.
///
/// # Examples
///
/// ```
/// use wit::url::matches_pattern;
///
/// assert!(matches_pattern("/blog/post", "/blog/*"));
/// assert!(matches_pattern("/docs", "/docs"));
/// assert!(!matches_pattern("/about", "/blog/*"));
/// ```
pub fn matches_pattern(path: &str, pattern: &str) -> bool {
    let escaped = regex::escape(pattern).replace(r"\*", ".*");
    let anchored = format!("^{}$", escaped);

    // Escaped patterns are always valid regexes
    match Regex::new(&anchored) {
        Ok(re) => re.is_match(path),
        Err(_) => false,
    }
}

/// Decides whether a path passes the include/exclude policy
///
/// Exclusions are checked first and always win. An empty include list means
/// everything not excluded is included; otherwise at least one include
/// pattern must match.
pub fn should_include(path: &str, include: &[String], exclude: &[String]) -> bool {
    if exclude.iter().any(|p| matches_pattern(path, p)) {
        return false;
    }

    if include.is_empty() {
        return true;
    }

    include.iter().any(|p| matches_pattern(path, p))
}
