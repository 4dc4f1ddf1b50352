//! Language detection (`detect_language`).

use std::path::Path;

/// The set of languages this build of the parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageTag {
    Python,
    TypeScript,
    Tsx,
    JavaScript,
    Rust,
    Go,
    Java,
    Kotlin,
}

impl LanguageTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageTag::Python => "python",
            LanguageTag::TypeScript => "typescript",
            LanguageTag::Tsx => "tsx",
            LanguageTag::JavaScript => "javascript",
            LanguageTag::Rust => "rust",
            LanguageTag::Go => "go",
            LanguageTag::Java => "java",
            LanguageTag::Kotlin => "kotlin",
        }
    }
}

/// Extension-based detection with an explicit registry.
///
/// JavaScript files are parsed with the TypeScript grammar in plain-JS mode
/// (no separate `tree-sitter-javascript` grammar is carried, matching the
/// teacher's dependency set); this only affects which syntax is accepted,
/// never which symbols are reported.
pub fn detect_language(path: &Path) -> Option<LanguageTag> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "py" | "pyi" => Some(LanguageTag::Python),
        "ts" | "mts" | "cts" => Some(LanguageTag::TypeScript),
        "tsx" => Some(LanguageTag::Tsx),
        "js" | "mjs" | "cjs" | "jsx" => Some(LanguageTag::JavaScript),
        "rs" => Some(LanguageTag::Rust),
        "go" => Some(LanguageTag::Go),
        "java" => Some(LanguageTag::Java),
        "kt" | "kts" => Some(LanguageTag::Kotlin),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_known_extensions() {
        assert_eq!(
            detect_language(Path::new("a.py")),
            Some(LanguageTag::Python)
        );
        assert_eq!(detect_language(Path::new("a.rs")), Some(LanguageTag::Rust));
        assert_eq!(
            detect_language(Path::new("a.ts")),
            Some(LanguageTag::TypeScript)
        );
    }

    #[test]
    fn unknown_extension_returns_none() {
        assert_eq!(detect_language(Path::new("a.xyz")), None);
    }

    #[test]
    fn missing_extension_returns_none() {
        assert_eq!(detect_language(Path::new("Makefile")), None);
    }
}
