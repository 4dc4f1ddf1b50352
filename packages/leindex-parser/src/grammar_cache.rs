//! Process-wide grammar registry: grammars are acquired on first use and
//! never unloaded for the lifetime of the process.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use tree_sitter::Language;

use crate::language::LanguageTag;

static CACHE: Lazy<RwLock<HashMap<LanguageTag, Language>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn load(tag: LanguageTag) -> Language {
    match tag {
        LanguageTag::Python => tree_sitter_python::language(),
        LanguageTag::TypeScript => tree_sitter_typescript::language_typescript(),
        LanguageTag::Tsx => tree_sitter_typescript::language_tsx(),
        LanguageTag::JavaScript => tree_sitter_typescript::language_typescript(),
        LanguageTag::Rust => tree_sitter_rust::language(),
        LanguageTag::Go => tree_sitter_go::language(),
        LanguageTag::Java => tree_sitter_java::language(),
        LanguageTag::Kotlin => tree_sitter_kotlin::language(),
    }
}

/// Returns the grammar for `tag`, loading and caching it on first use.
/// Safe to call concurrently from many parser threads.
pub fn grammar_for(tag: LanguageTag) -> Language {
    if let Some(lang) = CACHE.read().expect("grammar cache poisoned").get(&tag) {
        return lang.clone();
    }
    let lang = load(tag);
    CACHE
        .write()
        .expect("grammar cache poisoned")
        .entry(tag)
        .or_insert(lang)
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_lookups_return_usable_grammars() {
        let a = grammar_for(LanguageTag::Python);
        let b = grammar_for(LanguageTag::Python);
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&a).unwrap();
        assert!(parser.parse("def f(): pass", None).is_some());
        parser.set_language(&b).unwrap();
        assert!(parser.parse("def g(): pass", None).is_some());
    }
}
