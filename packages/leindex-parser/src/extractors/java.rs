use tree_sitter::Node;

use super::NodeProfile;
use crate::complexity::ComplexityKinds;

pub static PROFILE: NodeProfile = NodeProfile {
    function_kinds: &["method_declaration", "constructor_declaration"],
    method_kinds: &["method_declaration", "constructor_declaration"],
    class_kinds: &["class_declaration", "interface_declaration"],
    name_field: "name",
    params_field: Some("parameters"),
    return_type_field: Some("type"),
    body_field: Some("body"),
    call_kinds: &["method_invocation"],
    call_function_field: "name",
    inherits_field: Some("superclass"),
    complexity: ComplexityKinds {
        decision_kinds: &[
            "if_statement",
            "for_statement",
            "enhanced_for_statement",
            "while_statement",
            "catch_clause",
            "switch_label",
            "ternary_expression",
            "binary_expression",
        ],
        nesting_kinds: &[
            "if_statement",
            "for_statement",
            "enhanced_for_statement",
            "while_statement",
            "try_statement",
            "switch_expression",
        ],
    },
    docstring,
    is_async,
};

/// Javadoc comments are preceding sibling `block_comment` nodes starting `/**`.
fn docstring(node: Node, source: &[u8]) -> Option<String> {
    let sibling = node.prev_sibling()?;
    if sibling.kind() != "block_comment" {
        return None;
    }
    let text = sibling.utf8_text(source).ok()?;
    if !text.starts_with("/**") {
        return None;
    }
    Some(text.to_string())
}

fn is_async(_node: Node, _source: &[u8]) -> bool {
    false
}
