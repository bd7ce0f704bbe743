use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

/// Class names accepted as language hints without a `language-`/`lang-` prefix
pub(crate) const KNOWN_LANGUAGES: &[&str] = &[
    "python",
    "javascript",
    "typescript",
    "java",
    "go",
    "rust",
    "ruby",
    "php",
    "csharp",
    "cpp",
    "c",
    "bash",
    "shell",
    "sql",
    "json",
    "yaml",
    "xml",
    "html",
    "css",
];

/// Source-shape heuristics tried in order; first match wins
static PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (
            r"^(import |from .+ import |def |class |if __name__|print\()",
            "python",
        ),
        (
            r"^(const |let |var |function |import .+ from|export |=>)",
            "javascript",
        ),
        (
            r"^(public class |private |protected |package |import java\.)",
            "java",
        ),
        (r"^(package |func |import \(|var |type .+ struct)", "go"),
        (r"^(fn |let mut |use |pub |impl |struct |enum )", "rust"),
        (r"^(require |def |class |module |end$|puts )", "ruby"),
        (r"^(<\?php|\$\w+ = |function |namespace |use )", "php"),
        (r"^(#!/bin/|#!.*bash|export |echo |if \[|\$\()", "bash"),
        (
            r"^(SELECT |INSERT |UPDATE |DELETE |CREATE |DROP |ALTER )",
            "sql",
        ),
        (r"^<!DOCTYPE|^<html|^<head|^<body", "html"),
        (r"^(\.|#|@media|@import|body\s*\{)", "css"),
        (r"^\s*[\{\[].*[\}\]]\s*$", "json"),
        (r"^[a-zA-Z_]+:\s*$|^- [a-zA-Z]", "yaml"),
        (r"^<\?xml|^<[a-zA-Z]+>", "xml"),
    ]
    .into_iter()
    .map(|(pattern, lang)| {
        let regex = RegexBuilder::new(pattern)
            .multi_line(true)
            .case_insensitive(true)
            .build()
            .expect("static pattern compiles");
        (regex, lang)
    })
    .collect()
});

/// Best-effort language detection for an untagged code block
pub fn detect_language(code: &str) -> Option<&'static str> {
    let code = code.trim();
    if code.is_empty() {
        return None;
    }

    PATTERNS
        .iter()
        .find(|(regex, _)| regex.is_match(code))
        .map(|&(_, lang)| lang)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_python() {
        assert_eq!(detect_language("def main():\n    pass"), Some("python"));
        assert_eq!(detect_language("import os\nprint(os.sep)"), Some("python"));
    }

    #[test]
    fn test_detect_rust() {
        assert_eq!(detect_language("fn main() {}"), Some("rust"));
        assert_eq!(detect_language("pub struct Point;"), Some("rust"));
    }

    #[test]
    fn test_detect_javascript() {
        assert_eq!(detect_language("const x = 1;"), Some("javascript"));
    }

    #[test]
    fn test_detect_sql_case_insensitive() {
        assert_eq!(detect_language("select * from users"), Some("sql"));
    }

    #[test]
    fn test_detect_multiline() {
        // The signature is not on the first line
        assert_eq!(
            detect_language("// entry point\nfn main() {}"),
            Some("rust")
        );
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_language("just some prose"), None);
        assert_eq!(detect_language(""), None);
    }
}
