//! Top-level entry point (`parse`).

use tree_sitter::Parser;

use crate::diagnostics::Diag;
use crate::extractors;
use crate::grammar_cache;
use crate::language::LanguageTag;
use crate::normalize;
use crate::signature::ParseOutput;

/// Parses one file's bytes under the given language tag.
///
/// On invalid UTF-8 this returns immediately with a single
/// [`Diag::InvalidEncoding`] and no symbols; tree-sitter requires valid
/// UTF-8 input. Syntax errors tree-sitter recovers from are reported as
/// [`Diag::PartialParse`] alongside whatever symbols were still extracted
/// from the surrounding, well-formed parts of the tree.
pub fn parse(tag: LanguageTag, bytes: &[u8]) -> ParseOutput {
    let source = match std::str::from_utf8(bytes) {
        Ok(s) => s,
        Err(_) => {
            return ParseOutput {
                diagnostics: vec![Diag::InvalidEncoding],
                ..Default::default()
            }
        }
    };

    let grammar = grammar_cache::grammar_for(tag);
    let mut parser = Parser::new();
    if parser.set_language(&grammar).is_err() {
        return ParseOutput {
            diagnostics: vec![Diag::Unsupported],
            ..Default::default()
        };
    }

    let Some(tree) = parser.parse(bytes, None) else {
        return ParseOutput {
            diagnostics: vec![Diag::Unsupported],
            ..Default::default()
        };
    };

    let mut diagnostics = Vec::new();
    if let Some(error_node) = find_first_error(tree.root_node()) {
        diagnostics.push(Diag::PartialParse {
            byte_offset: error_node.start_byte(),
        });
    }

    let hash =
        |text: &str| leindex_storage::hashing::blake3_hex(normalize::normalize_for_hash(tag, text).as_bytes());

    let (symbols, hints) = extractors::extract(tag, tree.root_node(), bytes, hash);

    ParseOutput {
        symbols,
        hints,
        diagnostics,
    }
}

fn find_first_error(node: tree_sitter::Node) -> Option<tree_sitter::Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(err) = find_first_error(child) {
            return Some(err);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_python_extracts_function_symbol() {
        let out = parse(
            LanguageTag::Python,
            b"def greet(name):\n    \"\"\"Say hi.\"\"\"\n    return name\n",
        );
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.symbols.len(), 1);
        assert_eq!(out.symbols[0].symbol_name, "greet");
        assert_eq!(out.symbols[0].docstring.as_deref(), Some("Say hi."));
    }

    #[test]
    fn invalid_utf8_is_reported_without_parsing() {
        let out = parse(LanguageTag::Python, &[0xff, 0xfe, 0x00]);
        assert_eq!(out.diagnostics, vec![Diag::InvalidEncoding]);
        assert!(out.symbols.is_empty());
    }

    #[test]
    fn syntax_error_still_yields_partial_symbols() {
        let out = parse(
            LanguageTag::Python,
            b"def ok():\n    return 1\n\ndef broken(:\n    pass\n",
        );
        assert!(out
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diag::PartialParse { .. })));
        assert!(out.symbols.iter().any(|s| s.symbol_name == "ok"));
    }

    #[test]
    fn call_hints_reference_enclosing_symbol() {
        let out = parse(
            LanguageTag::Python,
            b"def outer():\n    inner()\n\ndef inner():\n    pass\n",
        );
        assert!(out
            .hints
            .calls
            .iter()
            .any(|c| c.caller_name == "outer" && c.callee_text == "inner"));
    }

    #[test]
    fn identical_bodies_with_different_whitespace_hash_equal() {
        let a = parse(LanguageTag::Python, b"def f():\n    return 1\n");
        let b = parse(LanguageTag::Python, b"def f():  \r\n    return 1\r\n");
        assert_eq!(a.symbols[0].content_hash, b.symbols[0].content_hash);
    }
}
