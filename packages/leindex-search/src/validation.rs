//! Query validation ("Validation"): length limits, catastrophic
//! regex rejection, and embedding dimension checks, all of which must fail
//! before touching any index.

use crate::error::SearchError;

pub const MAX_QUERY_LEN: usize = 1024;

pub fn validate_query_text(query: &str) -> Result<(), SearchError> {
    if query.is_empty() {
        return Err(SearchError::invalid_query("query must not be empty"));
    }
    if query.len() > MAX_QUERY_LEN {
        return Err(SearchError::invalid_query(format!(
            "query exceeds maximum length of {MAX_QUERY_LEN} bytes"
        )));
    }
    if looks_like_regex(query) {
        check_regex_safety(query)?;
    }
    Ok(())
}

pub fn validate_embedding_dimension(embedding: &[f32], expected: usize) -> Result<(), SearchError> {
    if embedding.len() != expected {
        return Err(SearchError::invalid_query(format!(
            "embedding dimension {} does not match project dimension {}",
            embedding.len(),
            expected
        )));
    }
    Ok(())
}

fn looks_like_regex(query: &str) -> bool {
    query.starts_with('/') && query.ends_with('/') && query.len() > 1
        || query.contains(".*")
        || query.contains(".+")
        || query.contains("(?:")
}

/// A cheap static check for alternation depth and nested unbounded
/// quantifiers that are the classic catastrophic-backtracking shape
/// (`(a+)+`, `(a|aa)+`, deeply nested groups). This is deliberately
/// conservative: it rejects *suspicious* patterns rather than proving
/// exponential blowup, since the latter is undecidable in general.
fn check_regex_safety(query: &str) -> Result<(), SearchError> {
    let pattern = query.trim_matches('/');

    let mut depth = 0i32;
    let mut max_depth = 0i32;
    let mut nested_quantifier_groups = 0usize;
    let mut chars = pattern.char_indices().peekable();
    let mut group_has_quantifier_inside = vec![false];

    while let Some((_, ch)) = chars.next() {
        match ch {
            '(' => {
                depth += 1;
                max_depth = max_depth.max(depth);
                group_has_quantifier_inside.push(false);
            }
            ')' => {
                let inner_had_quantifier = group_has_quantifier_inside.pop().unwrap_or(false);
                depth -= 1;
                if inner_had_quantifier {
                    if let Some((_, next)) = chars.peek() {
                        if matches!(next, '+' | '*') {
                            nested_quantifier_groups += 1;
                        }
                    }
                }
            }
            '+' | '*' => {
                if let Some(flag) = group_has_quantifier_inside.last_mut() {
                    *flag = true;
                }
            }
            _ => {}
        }
    }

    if max_depth > 8 {
        return Err(SearchError::invalid_query(
            "query regex alternation/group depth too large",
        ));
    }
    if nested_quantifier_groups > 0 {
        return Err(SearchError::invalid_query(
            "query regex contains a nested unbounded quantifier (catastrophic backtracking risk)",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_query() {
        assert!(validate_query_text("").is_err());
    }

    #[test]
    fn rejects_overlong_query() {
        let long = "a".repeat(MAX_QUERY_LEN + 1);
        assert!(validate_query_text(&long).is_err());
    }

    #[test]
    fn accepts_plain_identifier_query() {
        assert!(validate_query_text("parse_config").is_ok());
    }

    #[test]
    fn rejects_nested_unbounded_quantifier() {
        assert!(validate_query_text("/(a+)+/").is_err());
    }

    #[test]
    fn accepts_simple_wildcard_regex() {
        assert!(validate_query_text("/get.*Name/").is_ok());
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let embedding = vec![0.0_f32; 384];
        assert!(validate_embedding_dimension(&embedding, 768).is_err());
        assert!(validate_embedding_dimension(&embedding, 384).is_ok());
    }
}
