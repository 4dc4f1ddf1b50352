//! Identifier tokenizer for the lexical index ("Identifier tokens
//! are split by camelCase/snake_case/digit boundaries; path segments and
//! file extension are distinct tokens").

use tantivy::tokenizer::{LowerCaser, TextAnalyzer, Token, TokenStream, Tokenizer};
use unicode_normalization::UnicodeNormalization;

/// Splits `getUserName2` -> `["get", "User", "Name", "2"]`,
/// `get_user_name` -> `["get", "user", "name"]`,
/// `HTTPSConnection` -> `["HTTPS", "Connection"]`. Input is NFC-normalized
/// first so composed and decomposed Unicode identifiers tokenize the same
/// way ("Unicode identifiers are tokenized consistently").
#[derive(Clone)]
pub struct IdentifierTokenizer;

impl Tokenizer for IdentifierTokenizer {
    type TokenStream<'a> = IdentifierTokenStream;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        let normalized: String = text.nfc().collect();
        IdentifierTokenStream {
            tokens: split_identifier(&normalized),
            current: 0,
        }
    }
}

pub struct IdentifierTokenStream {
    tokens: Vec<Token>,
    current: usize,
}

impl TokenStream for IdentifierTokenStream {
    fn advance(&mut self) -> bool {
        if self.current < self.tokens.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn token(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.tokens[self.current - 1]
    }
}

/// Pure splitting function, exposed separately so the query-side expansion
/// (e.g. fuzzy prefix matching) can tokenize without going through Tantivy.
pub fn split_identifier(text: &str) -> Vec<Token> {
    #[derive(PartialEq, Eq, Clone, Copy)]
    enum Class {
        Upper,
        Lower,
        Digit,
        Other,
    }

    fn classify(ch: char) -> Class {
        if ch.is_uppercase() {
            Class::Upper
        } else if ch.is_lowercase() {
            Class::Lower
        } else if ch.is_ascii_digit() {
            Class::Digit
        } else {
            Class::Other
        }
    }

    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut start = 0usize;
    let mut position = 0usize;

    let mut push = |tokens: &mut Vec<Token>, position: &mut usize, from: usize, to: usize| {
        if from >= to {
            return;
        }
        let piece: String = chars[from..to].iter().collect();
        if piece.is_empty() || piece.chars().all(|c| classify(c) == Class::Other) {
            return;
        }
        tokens.push(Token {
            offset_from: from,
            offset_to: to,
            position: *position,
            text: piece,
            position_length: 1,
        });
        *position += 1;
    };

    let mut i = 0;
    while i < chars.len() {
        let class = classify(chars[i]);
        if class == Class::Other {
            push(&mut tokens, &mut position, start, i);
            start = i + 1;
            i += 1;
            continue;
        }
        let next_class = chars.get(i + 1).map(|c| classify(*c));
        let boundary_after = match (class, next_class) {
            // camelCase: lower/digit -> Upper
            (Class::Lower, Some(Class::Upper)) => true,
            (Class::Digit, Some(Class::Upper)) | (Class::Digit, Some(Class::Lower)) => true,
            (Class::Upper, Some(Class::Digit)) => true,
            (Class::Lower, Some(Class::Digit)) => true,
            // HTTPSConnection: break before the last upper of a run when
            // followed by a lowercase letter ("HTTPS" | "Connection").
            (Class::Upper, Some(Class::Lower)) if i > start && preceding_is_upper(&chars, i) => {
                push(&mut tokens, &mut position, start, i);
                start = i;
                false
            }
            _ => false,
        };
        if boundary_after {
            push(&mut tokens, &mut position, start, i + 1);
            start = i + 1;
        }
        i += 1;
    }
    push(&mut tokens, &mut position, start, chars.len());
    tokens
}

fn preceding_is_upper(chars: &[char], i: usize) -> bool {
    i > 0 && chars[i - 1].is_uppercase()
}

/// The analyzer registered against symbol-name-bearing fields: identifier
/// splitting followed by lowercasing.
pub fn identifier_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(IdentifierTokenizer)
        .filter(LowerCaser)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        split_identifier(text).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn splits_camel_case() {
        assert_eq!(words("getUserName"), vec!["get", "User", "Name"]);
    }

    #[test]
    fn splits_snake_case() {
        assert_eq!(words("get_user_name"), vec!["get", "user", "name"]);
    }

    #[test]
    fn splits_acronym_runs() {
        assert_eq!(words("HTTPSConnection"), vec!["HTTPS", "Connection"]);
    }

    #[test]
    fn splits_digit_boundaries() {
        assert_eq!(words("parseV2Response"), vec!["parse", "V", "2", "Response"]);
    }

    #[test]
    fn path_segments_are_distinct_tokens_via_slash_split() {
        assert_eq!(
            words("src/lib.rs"),
            vec!["src", "lib", "rs"]
        );
    }
}
