//! DOM to markdown rendering
//!
//! Works directly on the parsed tree rather than re-serializing HTML.
//! Removed elements are carried as a set of node ids and their subtrees are
//! skipped during the walk, since the parsed tree itself is immutable.

use super::language::{detect_language, KNOWN_LANGUAGES};
use crate::config::{HeadingStyle, LanguageDetection, MarkdownConfig};
use ego_tree::{NodeId, NodeRef};
use scraper::node::{Element, Node};
use scraper::ElementRef;
use std::collections::HashSet;

/// Renders an element subtree to markdown blocks
pub fn element_to_markdown(
    root: ElementRef,
    removed: &HashSet<NodeId>,
    config: &MarkdownConfig,
) -> String {
    let renderer = Renderer { config, removed };
    renderer.render_blocks(*root).join("\n\n")
}

/// Normalizes whitespace in finished markdown
///
/// Trims trailing space per line, caps blank runs at two, strips the ends,
/// and guarantees exactly one trailing newline.
pub fn clean_markdown(markdown: &str) -> String {
    let mut lines = Vec::new();
    let mut blank_run = 0usize;

    for line in markdown.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run <= 2 {
                lines.push(line);
            }
        } else {
            blank_run = 0;
            lines.push(line);
        }
    }

    let mut cleaned = lines.join("\n").trim().to_string();
    cleaned.push('\n');
    cleaned
}

struct Renderer<'a> {
    config: &'a MarkdownConfig,
    removed: &'a HashSet<NodeId>,
}

impl Renderer<'_> {
    /// Renders a node's children as a sequence of markdown blocks, batching
    /// runs of inline content into paragraphs
    fn render_blocks(&self, node: NodeRef<Node>) -> Vec<String> {
        let mut blocks = Vec::new();
        let mut inline = String::new();

        for child in node.children() {
            if self.removed.contains(&child.id()) {
                continue;
            }

            match child.value() {
                Node::Text(text) => inline.push_str(&collapse_whitespace(text)),
                Node::Element(element) => {
                    let tag = element.name();
                    if is_block(tag) {
                        self.flush_inline(&mut inline, &mut blocks);
                        blocks.extend(self.render_block_element(child, tag));
                    } else {
                        inline.push_str(&self.render_inline(child));
                    }
                }
                _ => {}
            }
        }

        self.flush_inline(&mut inline, &mut blocks);
        blocks
    }

    fn flush_inline(&self, inline: &mut String, blocks: &mut Vec<String>) {
        let paragraph = tidy_inline(inline);
        if !paragraph.is_empty() {
            blocks.push(paragraph);
        }
        inline.clear();
    }

    fn render_block_element(&self, node: NodeRef<Node>, tag: &str) -> Vec<String> {
        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag.as_bytes()[1] - b'0';
                self.render_heading(node, level as usize).into_iter().collect()
            }
            "p" => {
                let text = tidy_inline(&self.render_children_inline(node));
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![text]
                }
            }
            "ul" => self.render_list(node, false).into_iter().collect(),
            "ol" => self.render_list(node, true).into_iter().collect(),
            "pre" => self.render_code_block(node).into_iter().collect(),
            "blockquote" => self.render_blockquote(node).into_iter().collect(),
            "table" => self.render_table(node).into_iter().collect(),
            "hr" => vec!["---".to_string()],
            "script" | "style" | "noscript" | "template" | "head" | "iframe" => Vec::new(),
            // Generic container
            _ => self.render_blocks(node),
        }
    }

    fn render_heading(&self, node: NodeRef<Node>, level: usize) -> Option<String> {
        let text = tidy_inline(&self.render_children_inline(node)).replace('\n', " ");
        if text.is_empty() {
            return None;
        }

        let heading = match (self.config.heading_style, level) {
            (HeadingStyle::Setext, 1) => format!("{}\n{}", text, "=".repeat(text.chars().count())),
            (HeadingStyle::Setext, 2) => format!("{}\n{}", text, "-".repeat(text.chars().count())),
            // Setext has no form for deeper levels
            _ => format!("{} {}", "#".repeat(level), text),
        };

        Some(heading)
    }

    fn render_children_inline(&self, node: NodeRef<Node>) -> String {
        let mut out = String::new();
        for child in node.children() {
            if self.removed.contains(&child.id()) {
                continue;
            }
            out.push_str(&self.render_inline(child));
        }
        out
    }

    fn render_inline(&self, node: NodeRef<Node>) -> String {
        match node.value() {
            Node::Text(text) => collapse_whitespace(text),
            Node::Element(element) => match element.name() {
                "strong" | "b" => wrap_if_nonempty(&self.render_children_inline(node), "**"),
                "em" | "i" => wrap_if_nonempty(&self.render_children_inline(node), "*"),
                "code" => {
                    let code = collapse_whitespace(&self.raw_text(node));
                    let code = code.trim();
                    if code.is_empty() {
                        String::new()
                    } else {
                        format!("`{}`", code)
                    }
                }
                "a" => self.render_link(node, element),
                "img" => self.render_image(element),
                "br" => "\n".to_string(),
                "script" | "style" | "noscript" | "template" => String::new(),
                _ => self.render_children_inline(node),
            },
            _ => String::new(),
        }
    }

    fn render_link(&self, node: NodeRef<Node>, element: &Element) -> String {
        let text = self.render_children_inline(node);
        if self.config.strip_links {
            return text;
        }

        let href = element.attr("href").unwrap_or("").trim();
        if href.is_empty() || href.starts_with('#') {
            return text;
        }

        let text = tidy_inline(&text);
        if text.is_empty() {
            return String::new();
        }

        format!("[{}]({})", text, href)
    }

    fn render_image(&self, element: &Element) -> String {
        if !self.config.include_images {
            return String::new();
        }

        let src = element.attr("src").unwrap_or("").trim();
        if src.is_empty() {
            return String::new();
        }

        let alt = element.attr("alt").unwrap_or("").trim();
        format!("![{}]({})", alt, src)
    }

    fn render_list(&self, node: NodeRef<Node>, ordered: bool) -> Option<String> {
        let mut lines = Vec::new();
        let mut index = 1usize;

        for child in node.children() {
            if self.removed.contains(&child.id()) {
                continue;
            }
            let is_item = matches!(child.value(), Node::Element(el) if el.name() == "li");
            if !is_item {
                continue;
            }

            let content = self.render_blocks(child).join("\n");
            if content.is_empty() {
                continue;
            }

            let marker = if ordered {
                let marker = format!("{}. ", index);
                index += 1;
                marker
            } else {
                "- ".to_string()
            };

            let mut item_lines = content.lines();
            if let Some(first) = item_lines.next() {
                lines.push(format!("{}{}", marker, first));
                for rest in item_lines {
                    if rest.is_empty() {
                        lines.push(String::new());
                    } else {
                        lines.push(format!("  {}", rest));
                    }
                }
            }
        }

        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }

    fn render_code_block(&self, node: NodeRef<Node>) -> Option<String> {
        let code_child = node.children().find(
            |child| matches!(child.value(), Node::Element(el) if el.name() == "code"),
        );

        let (source, class_attr) = match code_child {
            Some(child) => {
                let class = match child.value() {
                    Node::Element(el) => el.attr("class"),
                    _ => None,
                };
                (child, class)
            }
            None => (node, None),
        };

        let code = self.raw_text(source);
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return None;
        }

        let mut language = class_attr.and_then(language_hint);
        if language.is_none() && self.config.code_language == LanguageDetection::Auto {
            language = detect_language(trimmed).map(str::to_string);
        }

        Some(format!(
            "```{}\n{}\n```",
            language.unwrap_or_default(),
            trimmed
        ))
    }

    fn render_blockquote(&self, node: NodeRef<Node>) -> Option<String> {
        let inner = self.render_blocks(node).join("\n\n");
        if inner.is_empty() {
            return None;
        }

        let quoted: Vec<String> = inner
            .lines()
            .map(|line| {
                if line.is_empty() {
                    ">".to_string()
                } else {
                    format!("> {}", line)
                }
            })
            .collect();

        Some(quoted.join("\n"))
    }

    fn render_table(&self, node: NodeRef<Node>) -> Option<String> {
        let mut rows: Vec<Vec<String>> = Vec::new();
        self.collect_rows(node, &mut rows);

        let header = rows.first()?;
        let width = header.len();
        if width == 0 {
            return None;
        }

        let mut lines = vec![
            format!("| {} |", header.join(" | ")),
            format!("| {} |", vec!["---"; width].join(" | ")),
        ];

        for row in rows.iter().skip(1) {
            let mut cells = row.clone();
            cells.resize(width, String::new());
            lines.push(format!("| {} |", cells.join(" | ")));
        }

        Some(lines.join("\n"))
    }

    fn collect_rows(&self, node: NodeRef<Node>, rows: &mut Vec<Vec<String>>) {
        for child in node.children() {
            if self.removed.contains(&child.id()) {
                continue;
            }
            let tag = match child.value() {
                Node::Element(el) => el.name(),
                _ => continue,
            };

            match tag {
                "thead" | "tbody" | "tfoot" => self.collect_rows(child, rows),
                "tr" => {
                    let mut cells = Vec::new();
                    for cell in child.children() {
                        if self.removed.contains(&cell.id()) {
                            continue;
                        }
                        let is_cell = matches!(
                            cell.value(),
                            Node::Element(el) if el.name() == "td" || el.name() == "th"
                        );
                        if is_cell {
                            let text = tidy_inline(&self.render_children_inline(cell))
                                .replace('\n', " ")
                                .replace('|', "\\|");
                            cells.push(text);
                        }
                    }
                    rows.push(cells);
                }
                _ => {}
            }
        }
    }

    /// Concatenated text content of a subtree, whitespace preserved
    fn raw_text(&self, node: NodeRef<Node>) -> String {
        let mut out = String::new();
        self.raw_text_into(node, &mut out);
        out
    }

    fn raw_text_into(&self, node: NodeRef<Node>, out: &mut String) {
        for child in node.children() {
            if self.removed.contains(&child.id()) {
                continue;
            }
            match child.value() {
                Node::Text(text) => out.push_str(text),
                Node::Element(_) => self.raw_text_into(child, out),
                _ => {}
            }
        }
    }
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "div"
            | "section"
            | "article"
            | "main"
            | "aside"
            | "header"
            | "footer"
            | "nav"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "ul"
            | "ol"
            | "li"
            | "pre"
            | "blockquote"
            | "hr"
            | "table"
            | "thead"
            | "tbody"
            | "tfoot"
            | "tr"
            | "figure"
            | "figcaption"
            | "details"
            | "summary"
            | "form"
            | "fieldset"
            | "dl"
            | "dt"
            | "dd"
            | "address"
            | "script"
            | "style"
            | "noscript"
            | "template"
            | "head"
            | "iframe"
            | "body"
            | "html"
    )
}

/// Collapses any whitespace run to a single space
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(ch);
            in_space = false;
        }
    }

    out
}

/// Tidies an inline run: collapses space runs per line and trims the ends
fn tidy_inline(text: &str) -> String {
    let lines: Vec<String> = text
        .split('\n')
        .map(|line| {
            let mut out = String::with_capacity(line.len());
            let mut in_space = false;
            for ch in line.chars() {
                if ch == ' ' || ch == '\t' {
                    if !in_space {
                        out.push(' ');
                        in_space = true;
                    }
                } else {
                    out.push(ch);
                    in_space = false;
                }
            }
            out.trim().to_string()
        })
        .collect();

    lines.join("\n").trim().to_string()
}

fn wrap_if_nonempty(text: &str, marker: &str) -> String {
    let text = tidy_inline(text);
    if text.is_empty() {
        String::new()
    } else {
        format!("{}{}{}", marker, text, marker)
    }
}

fn language_hint(class_attr: &str) -> Option<String> {
    for class in class_attr.split_whitespace() {
        if let Some(lang) = class.strip_prefix("language-") {
            return Some(lang.to_string());
        }
        if let Some(lang) = class.strip_prefix("lang-") {
            return Some(lang.to_string());
        }
        if KNOWN_LANGUAGES.contains(&class) {
            return Some(class.to_string());
        }
    }
    None
}
