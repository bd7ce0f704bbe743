//! HTML to markdown conversion and page document assembly

mod convert;
mod frontmatter;
mod language;

pub use convert::{clean_markdown, element_to_markdown};
pub use frontmatter::{comparison_basis, render_document};
pub use language::detect_language;
