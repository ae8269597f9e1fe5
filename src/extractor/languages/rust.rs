//! Rust symbol visitor.
//!
//! Records: mod_item, struct/enum/union/trait items, functions, const and
//! static items, and `use` leaves. `impl` blocks do not produce records of
//! their own; they scope their items under the implemented type.

use tree_sitter::Node;

use super::{within_depth, LanguageExtractor};
use crate::extractor::{named_children, node_text, ScopeBuilder};
use crate::symbol::SymbolKind;

/// Rust language symbol visitor.
pub struct RustExtractor;

impl LanguageExtractor for RustExtractor {
    fn language_id(&self) -> &'static str {
        "rust"
    }

    fn collect(&self, root: Node, source: &[u8], scope: &mut ScopeBuilder) {
        self.visit_children(root, source, scope, 0);
    }

    fn target_node_types(&self) -> &[&'static str] {
        &[
            "mod_item",
            "struct_item",
            "enum_item",
            "union_item",
            "trait_item",
            "impl_item",
            "function_item",
            "function_signature_item",
            "const_item",
            "static_item",
            "use_declaration",
        ]
    }
}

impl RustExtractor {
    fn visit(&self, node: Node, source: &[u8], scope: &mut ScopeBuilder, depth: usize) {
        if !within_depth(&node, depth, scope) {
            return;
        }

        match node.kind() {
            "mod_item" => self.visit_item(node, SymbolKind::Module, source, scope, depth),
            "struct_item" | "enum_item" | "union_item" | "trait_item" => {
                self.visit_item(node, SymbolKind::Class, source, scope, depth)
            }
            "function_item" | "function_signature_item" => {
                let kind = scope.function_kind();
                self.visit_item(node, kind, source, scope, depth);
            }
            "const_item" | "static_item" => {
                if scope.records_bindings() {
                    if let Some(name) = node.child_by_field_name("name") {
                        scope.add(node_text(&name, source), SymbolKind::Variable, &node);
                    }
                }
            }
            "impl_item" => self.visit_impl(node, source, scope, depth),
            "use_declaration" => {
                if scope.records_bindings() {
                    if let Some(argument) = node.child_by_field_name("argument") {
                        self.record_use(argument, source, scope);
                    }
                }
            }
            // Macro bodies are unparsed token streams
            "macro_invocation" | "token_tree" | "macro_definition" => {}
            _ => self.visit_children(node, source, scope, depth),
        }
    }

    fn visit_children(&self, node: Node, source: &[u8], scope: &mut ScopeBuilder, depth: usize) {
        for child in named_children(&node) {
            if scope.is_halted() {
                return;
            }
            self.visit(child, source, scope, depth + 1);
        }
    }

    fn visit_item(
        &self,
        node: Node,
        kind: SymbolKind,
        source: &[u8],
        scope: &mut ScopeBuilder,
        depth: usize,
    ) {
        let name = node
            .child_by_field_name("name")
            .map(|n| node_text(&n, source))
            .unwrap_or("");
        let id = scope.add(name, kind, &node);

        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        match id {
            Some(id) => {
                scope.enter(id);
                self.visit_children(body, source, scope, depth + 1);
                scope.exit();
            }
            None => self.visit_children(body, source, scope, depth + 1),
        }
    }

    fn visit_impl(&self, node: Node, source: &[u8], scope: &mut ScopeBuilder, depth: usize) {
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let Some(type_name) = node
            .child_by_field_name("type")
            .and_then(|ty| impl_type_name(ty, source))
            .filter(|name| !name.is_empty())
        else {
            self.visit_children(body, source, scope, depth + 1);
            return;
        };

        match scope.find_in_scope(type_name, SymbolKind::Class) {
            Some(id) => scope.enter(id),
            None => scope.enter_named(type_name, SymbolKind::Class),
        }
        self.visit_children(body, source, scope, depth + 1);
        scope.exit();
    }

    /// Record the names a `use` tree binds.
    fn record_use(&self, node: Node, source: &[u8], scope: &mut ScopeBuilder) {
        match node.kind() {
            "identifier" => {
                scope.add(node_text(&node, source), SymbolKind::Import, &node);
            }
            "scoped_identifier" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let name = node_text(&name, source);
                    // `use foo::{self}` re-binds the parent path's last segment
                    if name != "self" {
                        scope.add(name, SymbolKind::Import, &node);
                    }
                }
            }
            "use_as_clause" => {
                if let Some(alias) = node.child_by_field_name("alias") {
                    scope.add(node_text(&alias, source), SymbolKind::Import, &node);
                }
            }
            "use_list" => {
                for child in named_children(&node) {
                    self.record_use(child, source, scope);
                }
            }
            "scoped_use_list" => {
                if let Some(list) = node.child_by_field_name("list") {
                    self.record_use(list, source, scope);
                }
            }
            // use_wildcard, self, crate, super
            _ => {}
        }
    }
}

/// Last path segment of the type an `impl` block targets.
///
/// Slices, arrays, tuples, pointers and function types have no name, so
/// their items are recorded in the enclosing scope.
fn impl_type_name<'s>(ty: Node, source: &'s [u8]) -> Option<&'s str> {
    match ty.kind() {
        "type_identifier" | "primitive_type" => Some(node_text(&ty, source)),
        "generic_type" | "reference_type" => ty
            .child_by_field_name("type")
            .and_then(|inner| impl_type_name(inner, source)),
        // `dyn Trait`
        "dynamic_type" => ty
            .child_by_field_name("trait")
            .and_then(|inner| impl_type_name(inner, source)),
        "scoped_type_identifier" => ty
            .child_by_field_name("name")
            .map(|name| node_text(&name, source)),
        _ => None,
    }
}
