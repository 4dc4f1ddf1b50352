use tree_sitter::Node;

use super::NodeProfile;
use crate::complexity::ComplexityKinds;

pub static PROFILE: NodeProfile = NodeProfile {
    function_kinds: &["function_item"],
    method_kinds: &["function_item"],
    class_kinds: &["impl_item"],
    name_field: "name",
    params_field: Some("parameters"),
    return_type_field: Some("return_type"),
    body_field: Some("body"),
    call_kinds: &["call_expression", "macro_invocation"],
    call_function_field: "function",
    inherits_field: Some("trait"),
    complexity: ComplexityKinds {
        decision_kinds: &[
            "if_expression",
            "if_let_expression",
            "for_expression",
            "while_expression",
            "while_let_expression",
            "match_arm",
            "binary_expression",
        ],
        nesting_kinds: &[
            "if_expression",
            "for_expression",
            "while_expression",
            "loop_expression",
            "match_expression",
        ],
    },
    docstring,
    is_async,
};

/// `///` doc comments are preceding sibling `line_comment` nodes.
fn docstring(node: Node, source: &[u8]) -> Option<String> {
    let mut lines = Vec::new();
    let mut current = node.prev_sibling();
    while let Some(sibling) = current {
        if sibling.kind() != "line_comment" && sibling.kind() != "block_comment" {
            break;
        }
        let text = sibling.utf8_text(source).ok()?;
        if !text.starts_with("///") && !text.starts_with("/**") {
            break;
        }
        lines.push(text.trim_start_matches('/').trim().to_string());
        current = sibling.prev_sibling();
    }
    if lines.is_empty() {
        return None;
    }
    lines.reverse();
    Some(lines.join("\n"))
}

fn is_async(node: Node, source: &[u8]) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|c| c.utf8_text(source).unwrap_or("") == "async")
}
