//! Zero-copy multi-language AST extraction.
//!
//! [`parse`] is the single entry point: it resolves the file's grammar from
//! the process-wide [`grammar_cache`], walks the tree once without copying
//! the source buffer, and only allocates owned [`signature::SignatureInfo`]
//! records for the symbols it decides to keep. Six grammars are wired up
//! today (Python, TypeScript/TSX/JavaScript, Rust, Go, Java, Kotlin); adding
//! a seventh means adding a [`language::LanguageTag`] variant, a grammar
//! entry, and an [`extractors::NodeProfile`].

pub mod complexity;
pub mod diagnostics;
mod extractors;
pub mod grammar_cache;
pub mod hints;
pub mod language;
pub mod normalize;
mod parse;
pub mod signature;

pub use diagnostics::Diag;
pub use hints::{CallHint, InheritanceHint, ParseHints};
pub use language::{detect_language, LanguageTag};
pub use parse::parse;
pub use signature::{ParseOutput, SignatureInfo};

use rayon::prelude::*;

/// Parses many files concurrently across a rayon thread pool, pairing each
/// input with its own [`ParseOutput`]. Order of the returned vector matches
/// the order of `files`.
pub fn parse_many(files: &[(LanguageTag, Vec<u8>)]) -> Vec<ParseOutput> {
    files
        .par_iter()
        .map(|(tag, bytes)| parse(*tag, bytes))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_many_preserves_order() {
        let files = vec![
            (LanguageTag::Python, b"def a(): pass\n".to_vec()),
            (LanguageTag::Python, b"def b(): pass\n".to_vec()),
            (LanguageTag::Rust, b"fn c() {}\n".to_vec()),
        ];
        let results = parse_many(&files);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].symbols[0].symbol_name, "a");
        assert_eq!(results[1].symbols[0].symbol_name, "b");
        assert_eq!(results[2].symbols[0].symbol_name, "c");
    }
}
