use tree_sitter::Node;

use super::NodeProfile;
use crate::complexity::ComplexityKinds;

pub static PROFILE: NodeProfile = NodeProfile {
    function_kinds: &["function_declaration"],
    method_kinds: &["function_declaration"],
    class_kinds: &["class_declaration"],
    name_field: "name",
    params_field: Some("parameters"),
    return_type_field: Some("type"),
    body_field: Some("body"),
    call_kinds: &["call_expression"],
    call_function_field: "function",
    inherits_field: Some("delegation_specifiers"),
    complexity: ComplexityKinds {
        decision_kinds: &[
            "if_expression",
            "for_statement",
            "while_statement",
            "catch_block",
            "when_entry",
            "elvis_expression",
        ],
        nesting_kinds: &["if_expression", "for_statement", "while_statement", "when_expression"],
    },
    docstring,
    is_async,
};

/// KDoc comments are preceding sibling `multiline_comment` nodes starting `/**`.
fn docstring(node: Node, source: &[u8]) -> Option<String> {
    let sibling = node.prev_sibling()?;
    if sibling.kind() != "multiline_comment" {
        return None;
    }
    let text = sibling.utf8_text(source).ok()?;
    if !text.starts_with("/**") {
        return None;
    }
    Some(text.to_string())
}

/// Kotlin coroutines are library functions (`suspend` is a modifier keyword,
/// not a separate node kind difference tracked here).
fn is_async(node: Node, source: &[u8]) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|c| c.utf8_text(source).unwrap_or("") == "suspend")
}
