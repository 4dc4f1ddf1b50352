use tree_sitter::Node;

use super::NodeProfile;
use crate::complexity::ComplexityKinds;

pub static PROFILE: NodeProfile = NodeProfile {
    function_kinds: &["function_declaration", "function", "arrow_function"],
    method_kinds: &["method_definition"],
    class_kinds: &["class_declaration"],
    name_field: "name",
    params_field: Some("parameters"),
    return_type_field: Some("return_type"),
    body_field: Some("body"),
    call_kinds: &["call_expression"],
    call_function_field: "function",
    inherits_field: Some("heritage"),
    complexity: ComplexityKinds {
        decision_kinds: &[
            "if_statement",
            "for_statement",
            "for_in_statement",
            "while_statement",
            "catch_clause",
            "ternary_expression",
            "binary_expression",
            "switch_case",
        ],
        nesting_kinds: &[
            "if_statement",
            "for_statement",
            "for_in_statement",
            "while_statement",
            "try_statement",
            "switch_statement",
        ],
    },
    docstring,
    is_async,
};

/// JSDoc comments are siblings of the function node, not children, so this
/// walks up to the preceding sibling rather than reading a field.
fn docstring(node: Node, source: &[u8]) -> Option<String> {
    let mut sibling = node.prev_sibling()?;
    if sibling.kind() == "decorator" {
        sibling = sibling.prev_sibling()?;
    }
    if sibling.kind() != "comment" {
        return None;
    }
    let text = sibling.utf8_text(source).ok()?;
    if !text.starts_with("/**") {
        return None;
    }
    Some(text.to_string())
}

fn is_async(node: Node, source: &[u8]) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|c| c.utf8_text(source).unwrap_or("") == "async")
}
