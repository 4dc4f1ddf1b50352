//! Content-hash normalization policy.
//!
//! Two passes, always in this order:
//! 1. Trailing-whitespace stripping and CRLF/CR → LF normalization, for every
//!    language — a file re-saved with different line endings or trailing
//!    spaces must not appear "changed" to the incrementality layer.
//! 2. Comment stripping, for curly-brace "C-family" languages only
//!    (Rust, Go, Java, Kotlin). Python and TypeScript/JavaScript keep
//!    comments in the hash: docstrings and JSDoc carry semantic weight the
//!    other four languages don't attach to comments.

use crate::language::LanguageTag;

pub fn normalize_for_hash(tag: LanguageTag, text: &str) -> String {
    let line_normalized = strip_trailing_whitespace_and_crlf(text);
    if is_c_family(tag) {
        strip_comments(&line_normalized)
    } else {
        line_normalized
    }
}

fn is_c_family(tag: LanguageTag) -> bool {
    matches!(
        tag,
        LanguageTag::Rust | LanguageTag::Go | LanguageTag::Java | LanguageTag::Kotlin
    )
}

fn strip_trailing_whitespace_and_crlf(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        out.push_str(line.trim_end());
        out.push('\n');
    }
    if !text.ends_with('\n') && out.ends_with('\n') {
        out.pop();
    }
    out
}

/// Strips `//` line comments and `/* */` block comments, respecting simple
/// single- and double-quoted string literals so a `//` inside a string
/// literal isn't mistaken for a comment start. Raw strings, byte strings,
/// and escape sequences are not modeled; this is a hashing aid, not a
/// lexer, and false negatives here only cost an extra reindex.
fn strip_comments(text: &str) -> String {
    // Operates on raw bytes and copies them verbatim rather than casting
    // through `char`, so multi-byte UTF-8 sequences (never split, since every
    // branch below only matches single-byte ASCII markers) survive intact.
    let bytes = text.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(text.len());
    let mut i = 0;
    let mut in_string: Option<u8> = None;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(quote) = in_string {
            out.push(b);
            if b == b'\\' && i + 1 < bytes.len() {
                out.push(bytes[i + 1]);
                i += 2;
                continue;
            }
            if b == quote {
                in_string = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'"' | b'\'' => {
                in_string = Some(b);
                out.push(b);
                i += 1;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    if bytes[i] == b'\n' {
                        out.push(b'\n');
                    }
                    i += 1;
                }
                i += 2;
            }
            _ => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).expect("byte-for-byte copy of a valid UTF-8 str stays valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crlf_and_trailing_whitespace_are_normalized_for_every_language() {
        let a = normalize_for_hash(LanguageTag::Python, "def f: \r\n    pass\r\n");
        let b = normalize_for_hash(LanguageTag::Python, "def f:\n    pass\n");
        assert_eq!(a, b);
    }

    #[test]
    fn comments_are_stripped_for_c_family_only() {
        let rust_a = normalize_for_hash(LanguageTag::Rust, "fn f() {} // note\n");
        let rust_b = normalize_for_hash(LanguageTag::Rust, "fn f() {} // different note\n");
        assert_eq!(rust_a, rust_b);

        let ts_a = normalize_for_hash(LanguageTag::TypeScript, "function f() {} // note\n");
        let ts_b =
            normalize_for_hash(LanguageTag::TypeScript, "function f() {} // different note\n");
        assert_ne!(ts_a, ts_b);
    }

    #[test]
    fn slashes_inside_string_literals_are_not_comments() {
        let normalized = normalize_for_hash(LanguageTag::Go, "x := \"http://example.com\"\n");
        assert!(normalized.contains("http://example.com"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_tag() -> impl Strategy<Value = LanguageTag> {
        prop_oneof![
            Just(LanguageTag::Python),
            Just(LanguageTag::Rust),
            Just(LanguageTag::Go),
            Just(LanguageTag::Java),
            Just(LanguageTag::Kotlin),
            Just(LanguageTag::TypeScript),
        ]
    }

    proptest! {
        // normalize_for_hash is the input to content hashing, so it must be
        // a pure function of its arguments: same (tag, text) in, same
        // string out, every time.
        #[test]
        fn normalize_for_hash_is_pure(tag in any_tag(), text in ".{0,200}") {
            let a = normalize_for_hash(tag, &text);
            let b = normalize_for_hash(tag, &text);
            prop_assert_eq!(a, b);
        }

        // Re-normalizing already-normalized text is a no-op: trailing
        // whitespace/CRLF are already gone, and comment stripping on
        // comment-free text leaves it unchanged.
        #[test]
        fn normalize_for_hash_is_idempotent(tag in any_tag(), text in ".{0,200}") {
            let once = normalize_for_hash(tag, &text);
            let twice = normalize_for_hash(tag, &once);
            prop_assert_eq!(once, twice);
        }
    }
}
