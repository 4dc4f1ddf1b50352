//! Node-kind-table-driven symbol extraction, shared across all six grammars.
//!
//! Each language contributes a [`NodeProfile`] naming the tree-sitter node
//! and field kinds that stand for "this is a function", "this is a class",
//! "this is a call expression", plus two small per-language hooks
//! (docstring and async-modifier detection) where a flat table falls short.
//! The walk itself — recursing into bodies, tracking the enclosing symbol
//! for call hints, collecting inheritance hints from class headers — is
//! written once here.

mod go;
mod java;
mod kotlin;
mod python;
mod rust_lang;
mod typescript;

use leindex_storage::SymbolKind;
use tree_sitter::Node;

use crate::complexity::{self, ComplexityKinds};
use crate::hints::{CallHint, InheritanceHint, ParseHints};
use crate::language::LanguageTag;
use crate::signature::SignatureInfo;

pub struct NodeProfile {
    pub function_kinds: &'static [&'static str],
    pub method_kinds: &'static [&'static str],
    pub class_kinds: &'static [&'static str],
    pub name_field: &'static str,
    pub params_field: Option<&'static str>,
    pub return_type_field: Option<&'static str>,
    pub body_field: Option<&'static str>,
    pub call_kinds: &'static [&'static str],
    pub call_function_field: &'static str,
    pub inherits_field: Option<&'static str>,
    pub complexity: ComplexityKinds,
    pub docstring: fn(Node, &[u8]) -> Option<String>,
    pub is_async: fn(Node, &[u8]) -> bool,
}

pub fn profile_for(tag: LanguageTag) -> &'static NodeProfile {
    match tag {
        LanguageTag::Python => &python::PROFILE,
        LanguageTag::TypeScript | LanguageTag::Tsx | LanguageTag::JavaScript => {
            &typescript::PROFILE
        }
        LanguageTag::Rust => &rust_lang::PROFILE,
        LanguageTag::Go => &go::PROFILE,
        LanguageTag::Java => &java::PROFILE,
        LanguageTag::Kotlin => &kotlin::PROFILE,
    }
}

struct Walker<'a> {
    profile: &'a NodeProfile,
    source: &'a [u8],
    symbols: Vec<SignatureInfo>,
    hints: ParseHints,
    enclosing: Vec<String>,
}

pub fn extract(
    tag: LanguageTag,
    root: Node,
    source: &[u8],
    hash: impl Fn(&str) -> String,
) -> (Vec<SignatureInfo>, ParseHints) {
    let profile = profile_for(tag);
    let mut walker = Walker {
        profile,
        source,
        symbols: Vec::new(),
        hints: ParseHints::default(),
        enclosing: Vec::new(),
    };
    walker.walk(root, false, &hash);
    (walker.symbols, walker.hints)
}

impl<'a> Walker<'a> {
    fn walk(&mut self, node: Node, inside_class: bool, hash: &impl Fn(&str) -> String) {
        let kind = node.kind();

        if self.profile.class_kinds.contains(&kind) {
            let name = self.record_symbol(node, SymbolKind::Class, hash);
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                self.walk(child, true, hash);
            }
            let _ = name;
            return;
        }

        let is_function = self.profile.function_kinds.contains(&kind);
        let is_method = inside_class && self.profile.method_kinds.contains(&kind);
        if is_function || is_method {
            let kind_tag = if is_method {
                SymbolKind::Method
            } else {
                SymbolKind::Function
            };
            let name = self.record_symbol(node, kind_tag, hash);
            if let Some(name) = name {
                self.enclosing.push(name);
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.walk(child, false, hash);
                }
                self.enclosing.pop();
                return;
            }
        }

        if self.profile.call_kinds.contains(&kind) {
            self.record_call(node);
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child, inside_class, hash);
        }
    }

    fn text(&self, node: Node) -> String {
        node.utf8_text(self.source).unwrap_or("").to_string()
    }

    fn record_symbol(
        &mut self,
        node: Node,
        kind: SymbolKind,
        hash: &impl Fn(&str) -> String,
    ) -> Option<String> {
        let name_node = node.child_by_field_name(self.profile.name_field)?;
        let symbol_name = self.text(name_node);

        if kind == SymbolKind::Class {
            if let Some(field) = self.profile.inherits_field {
                if let Some(super_node) = node.child_by_field_name(field) {
                    self.hints.inheritance.push(InheritanceHint {
                        subtype_name: symbol_name.clone(),
                        supertype_text: self.text(super_node),
                        line: super_node.start_position().row as u32 + 1,
                    });
                }
            }
        }

        let parameters = self
            .profile
            .params_field
            .and_then(|f| node.child_by_field_name(f))
            .map(|params_node| {
                let mut cursor = params_node.walk();
                params_node
                    .named_children(&mut cursor)
                    .map(|child| self.text(child))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let return_type = self
            .profile
            .return_type_field
            .and_then(|f| node.child_by_field_name(f))
            .map(|n| self.text(n));

        let signature_text = self.text(node);
        let docstring = (self.profile.docstring)(node, self.source);
        let is_async = (self.profile.is_async)(node, self.source);
        let complexity = complexity::compute(node, self.source, &self.profile.complexity);
        let content_hash = hash(&signature_text);

        self.symbols.push(SignatureInfo {
            symbol_name: symbol_name.clone(),
            kind,
            signature_text,
            parameters,
            return_type,
            docstring,
            is_async,
            start_line: node.start_position().row as u32 + 1,
            end_line: node.end_position().row as u32 + 1,
            complexity,
            content_hash,
        });
        Some(symbol_name)
    }

    fn record_call(&mut self, node: Node) {
        let Some(caller_name) = self.enclosing.last().cloned() else {
            return;
        };
        let Some(callee_node) = node.child_by_field_name(self.profile.call_function_field) else {
            return;
        };
        self.hints.calls.push(CallHint {
            caller_name,
            callee_text: self.text(callee_node),
            line: node.start_position().row as u32 + 1,
        });
    }
}
