//! Content extraction
//!
//! Applies the site's selector configuration to a fetched document: removal
//! selectors prune boilerplate, content selectors pick the subtrees that
//! become markdown, and the title selector (with a `<title>` fallback)
//! names the page.

use crate::config::{MarkdownConfig, SelectorConfig};
use crate::markdown::{clean_markdown, element_to_markdown};
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no content matched selectors [{0}]")]
    NoContentMatched(String),
}

/// A page reduced to its content
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub title: Option<String>,
    pub markdown: String,
}

/// Extracts a page's content as markdown
///
/// Content selectors are tried in order and the first one with any match
/// wins; all of its matches become content roots, in document order. No
/// match at all is a failure for this page, not a fallback to the whole
/// document.
pub fn extract_page(
    html: &str,
    selectors: &SelectorConfig,
    markdown: &MarkdownConfig,
) -> Result<ExtractedPage, ExtractError> {
    let document = Html::parse_document(html);

    let mut removed: HashSet<NodeId> = HashSet::new();
    for raw in &selectors.remove {
        // Selectors were validated at config load
        if let Ok(selector) = Selector::parse(raw) {
            removed.extend(document.select(&selector).map(|el| el.id()));
        }
    }

    let title = extract_title(&document, selectors, &removed);

    let roots = find_content_roots(&document, selectors)?;
    let blocks: Vec<String> = roots
        .iter()
        .map(|root| element_to_markdown(*root, &removed, markdown))
        .filter(|block| !block.trim().is_empty())
        .collect();

    Ok(ExtractedPage {
        title,
        markdown: clean_markdown(&blocks.join("\n\n")),
    })
}

fn find_content_roots<'a>(
    document: &'a Html,
    selectors: &SelectorConfig,
) -> Result<Vec<ElementRef<'a>>, ExtractError> {
    if selectors.content.is_empty() {
        return Ok(vec![document.root_element()]);
    }

    for raw in &selectors.content {
        if let Ok(selector) = Selector::parse(raw) {
            let matches: Vec<ElementRef> = document.select(&selector).collect();
            if !matches.is_empty() {
                return Ok(matches);
            }
        }
    }

    Err(ExtractError::NoContentMatched(
        selectors.content.join(", "),
    ))
}

fn extract_title(
    document: &Html,
    selectors: &SelectorConfig,
    removed: &HashSet<NodeId>,
) -> Option<String> {
    if let Some(raw) = &selectors.title {
        if let Ok(selector) = Selector::parse(raw) {
            for element in document.select(&selector) {
                if is_removed(element, removed) {
                    continue;
                }
                let text = element_text(element);
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }

    // Fall back to the document title
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

/// Whether the element or any of its ancestors was matched for removal
fn is_removed(element: ElementRef, removed: &HashSet<NodeId>) -> bool {
    removed.contains(&element.id()) || element.ancestors().any(|node| removed.contains(&node.id()))
}

fn element_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
