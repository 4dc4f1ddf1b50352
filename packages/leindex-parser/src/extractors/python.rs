use tree_sitter::Node;

use super::NodeProfile;
use crate::complexity::ComplexityKinds;

pub static PROFILE: NodeProfile = NodeProfile {
    function_kinds: &["function_definition"],
    method_kinds: &["function_definition"],
    class_kinds: &["class_definition"],
    name_field: "name",
    params_field: Some("parameters"),
    return_type_field: Some("return_type"),
    body_field: Some("body"),
    call_kinds: &["call"],
    call_function_field: "function",
    inherits_field: Some("superclasses"),
    complexity: ComplexityKinds {
        decision_kinds: &[
            "if_statement",
            "elif_clause",
            "for_statement",
            "while_statement",
            "except_clause",
            "boolean_operator",
            "conditional_expression",
            "with_statement",
        ],
        nesting_kinds: &[
            "if_statement",
            "for_statement",
            "while_statement",
            "try_statement",
            "with_statement",
        ],
    },
    docstring,
    is_async,
};

fn docstring(node: Node, source: &[u8]) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    let mut cursor = body.walk();
    let first = body.named_children(&mut cursor).next()?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string_node = first.named_child(0)?;
    if string_node.kind() != "string" {
        return None;
    }
    Some(string_node.utf8_text(source).ok()?.trim_matches(['"', '\'']).to_string())
}

fn is_async(node: Node, source: &[u8]) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|c| c.utf8_text(source).unwrap_or("") == "async")
}
