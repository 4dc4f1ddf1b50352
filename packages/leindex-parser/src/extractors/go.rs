use tree_sitter::Node;

use super::NodeProfile;
use crate::complexity::ComplexityKinds;

pub static PROFILE: NodeProfile = NodeProfile {
    function_kinds: &["function_declaration"],
    method_kinds: &["method_declaration"],
    class_kinds: &["type_declaration"],
    name_field: "name",
    params_field: Some("parameters"),
    return_type_field: Some("result"),
    body_field: Some("body"),
    call_kinds: &["call_expression"],
    call_function_field: "function",
    inherits_field: None,
    complexity: ComplexityKinds {
        decision_kinds: &[
            "if_statement",
            "for_statement",
            "expression_case",
            "default_case",
            "communication_case",
            "binary_expression",
        ],
        nesting_kinds: &["if_statement", "for_statement", "select_statement", "type_switch_statement"],
    },
    docstring,
    is_async,
};

/// Go has no async keyword; goroutine/channel use is tracked via call hints
/// on `go` statements elsewhere, not here.
fn is_async(_node: Node, _source: &[u8]) -> bool {
    false
}

/// Doc comments are `comment` nodes immediately preceding the declaration.
fn docstring(node: Node, source: &[u8]) -> Option<String> {
    let sibling = node.prev_sibling()?;
    if sibling.kind() != "comment" {
        return None;
    }
    Some(sibling.utf8_text(source).ok()?.trim_start_matches("//").trim().to_string())
}
