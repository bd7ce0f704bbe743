use crate::config::MetadataConfig;
use chrono::{DateTime, Utc};
use url::Url;

/// Renders a page document: frontmatter (per the metadata toggles) plus body
///
/// Field order is fixed so that regenerating an unchanged page yields
/// byte-identical output apart from the timestamp.
pub fn render_document(
    body: &str,
    url: &Url,
    title: Option<&str>,
    metadata: &MetadataConfig,
    scraped_at: DateTime<Utc>,
) -> String {
    let mut fields = Vec::new();

    if metadata.include_source_url {
        fields.push(format!("source: {}", url));
    }

    if metadata.include_timestamp {
        fields.push(format!(
            "scraped_at: {}",
            scraped_at.format("%Y-%m-%dT%H:%M:%SZ")
        ));
    }

    if metadata.include_title {
        if let Some(title) = title {
            fields.push(format!("title: \"{}\"", title.replace('"', "\\\"")));
        }
    }

    if fields.is_empty() {
        body.to_string()
    } else {
        format!("---\n{}\n---\n\n{}", fields.join("\n"), body)
    }
}

/// Strips the volatile timestamp from a document for change comparison
///
/// Only the leading frontmatter block is touched, and only when every line
/// in it is a field this tool generates; a horizontal rule opening the body
/// is content, as is a `scraped_at:` line in the body.
pub fn comparison_basis(document: &str) -> String {
    let Some(rest) = document.strip_prefix("---\n") else {
        return document.to_string();
    };

    let Some(end) = rest.find("\n---\n\n") else {
        return document.to_string();
    };

    let (frontmatter, tail) = rest.split_at(end);

    if frontmatter.is_empty() || frontmatter.lines().any(|line| !is_metadata_line(line)) {
        return document.to_string();
    }

    let kept: Vec<&str> = frontmatter
        .lines()
        .filter(|line| !line.starts_with("scraped_at: "))
        .collect();

    format!("---\n{}{}", kept.join("\n"), tail)
}

fn is_metadata_line(line: &str) -> bool {
    ["source: ", "scraped_at: ", "title: "]
        .iter()
        .any(|field| line.starts_with(field))
}
