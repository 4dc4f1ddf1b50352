//! Complexity metrics computed over a single symbol's subtree (`ComplexityMetrics`).

use leindex_storage::ComplexityMetrics;
use tree_sitter::Node;

/// Per-language node-kind tables driving the generic complexity walk.
///
/// Cyclomatic complexity here is the standard McCabe count: one plus the
/// number of decision points (branches and boolean short-circuit operators)
/// in the subtree. Nesting depth is the deepest stack of nested compound
/// statements (`if`/`for`/`while`/`try`/...) anywhere under the symbol.
pub struct ComplexityKinds {
    pub decision_kinds: &'static [&'static str],
    pub nesting_kinds: &'static [&'static str],
}

pub fn compute(root: Node, source: &[u8], kinds: &ComplexityKinds) -> ComplexityMetrics {
    let mut decisions = 0u32;
    let mut max_nesting = 0u32;
    let mut tokens = 0u32;
    walk(root, kinds, 0, &mut decisions, &mut max_nesting, &mut tokens);

    let line_count = (root.end_position().row - root.start_position().row + 1) as u32;
    let _ = source;

    ComplexityMetrics {
        cyclomatic: decisions + 1,
        nesting_depth: max_nesting,
        line_count,
        token_count: tokens,
    }
}

fn walk(
    node: Node,
    kinds: &ComplexityKinds,
    depth: u32,
    decisions: &mut u32,
    max_nesting: &mut u32,
    tokens: &mut u32,
) {
    let kind = node.kind();
    let is_nesting = kinds.nesting_kinds.contains(&kind);
    if kinds.decision_kinds.contains(&kind) {
        *decisions += 1;
    }

    let next_depth = if is_nesting { depth + 1 } else { depth };
    if next_depth > *max_nesting {
        *max_nesting = next_depth;
    }

    if node.child_count() == 0 {
        *tokens += 1;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, kinds, next_depth, decisions, max_nesting, tokens);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_subtree_has_baseline_complexity() {
        const KINDS: ComplexityKinds = ComplexityKinds {
            decision_kinds: &[],
            nesting_kinds: &[],
        };
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&tree_sitter_python::language()).unwrap();
        let source = b"def f():\n    pass\n";
        let tree = parser.parse(source, None).unwrap();
        let metrics = compute(tree.root_node(), source, &KINDS);
        assert_eq!(metrics.cyclomatic, 1);
        assert_eq!(metrics.nesting_depth, 0);
    }
}
