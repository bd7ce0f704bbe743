use std::path::{Path, PathBuf};
use url::Url;

/// Maps a page URL to its file path under the output directory
///
/// The base URL's path prefix is stripped, `/` becomes `index.md`, `.html`
/// and `.htm` extensions are dropped, a trailing slash becomes a directory
/// index, and each segment is sanitized for the filesystem.
pub fn map_path(url: &Url, base: &Url, output_dir: &Path) -> PathBuf {
    let mut path = url.path();

    let base_path = base.path();
    if base_path != "/" && !base_path.is_empty() && path.starts_with(base_path) {
        path = &path[base_path.len()..];
    }

    let had_trailing_slash = path.ends_with('/');
    let trimmed = path.trim_matches('/');

    if trimmed.is_empty() {
        return output_dir.join("index.md");
    }

    let mut relative = trimmed.to_string();
    for ext in [".html", ".htm"] {
        if let Some(stem) = relative.strip_suffix(ext) {
            relative = stem.to_string();
            break;
        }
    }

    if had_trailing_slash {
        relative.push_str("/index");
    }

    let segments: Vec<String> = relative.split('/').map(sanitize_segment).collect();

    let mut result = output_dir.to_path_buf();
    let (last, parents) = segments.split_last().unwrap_or((&segments[0], &[]));
    for parent in parents {
        result.push(parent);
    }
    result.push(format!("{}.md", last));
    result
}

/// Sanitizes one path segment for the filesystem
///
/// Characters that are unsafe on common filesystems become dashes, dash
/// runs collapse to one, and an emptied segment becomes `unnamed`.
fn sanitize_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut last_dash = false;

    for ch in segment.chars() {
        let mapped = match ch {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '-',
            other => other,
        };
        if mapped == '-' {
            if !last_dash {
                out.push('-');
            }
            last_dash = true;
        } else {
            out.push(mapped);
            last_dash = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == '-' || c == ' ' || c == '\t');
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}
