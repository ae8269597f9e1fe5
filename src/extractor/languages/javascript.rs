//! JavaScript and TypeScript symbol visitor.
//!
//! The grammars share node names, so one visitor serves `javascript`,
//! `typescript` and `tsx`. TypeScript interfaces and enums are recorded as
//! classes; namespaces as modules.

use tree_sitter::Node;

use super::{within_depth, LanguageExtractor};
use crate::extractor::{named_children, node_text, ScopeBuilder};
use crate::symbol::SymbolKind;

/// JavaScript/TypeScript language symbol visitor.
pub struct JavaScriptExtractor {
    language: &'static str,
}

impl JavaScriptExtractor {
    pub fn new(language: &'static str) -> Self {
        Self { language }
    }
}

impl LanguageExtractor for JavaScriptExtractor {
    fn language_id(&self) -> &'static str {
        self.language
    }

    fn collect(&self, root: Node, source: &[u8], scope: &mut ScopeBuilder) {
        self.visit_children(root, source, scope, 0);
    }

    fn target_node_types(&self) -> &[&'static str] {
        &[
            "function_declaration",
            "generator_function_declaration",
            "function_signature",
            "class_declaration",
            "abstract_class_declaration",
            "class",
            "interface_declaration",
            "enum_declaration",
            "internal_module",
            "method_definition",
            "method_signature",
            "abstract_method_signature",
            "field_definition",
            "public_field_definition",
            "property_signature",
            "variable_declarator",
            "import_statement",
        ]
    }
}

impl JavaScriptExtractor {
    fn visit(&self, node: Node, source: &[u8], scope: &mut ScopeBuilder, depth: usize) {
        if !within_depth(&node, depth, scope) {
            return;
        }

        match node.kind() {
            "function_declaration"
            | "generator_function_declaration"
            | "function_signature" => {
                let kind = scope.function_kind();
                self.visit_declaration(node, node, "name", kind, source, scope, depth);
            }
            "class_declaration" | "abstract_class_declaration" | "class"
            | "interface_declaration" | "enum_declaration" => {
                self.visit_declaration(node, node, "name", SymbolKind::Class, source, scope, depth);
            }
            "internal_module" | "module" => {
                self.visit_declaration(node, node, "name", SymbolKind::Module, source, scope, depth);
            }
            "method_definition" if scope.scope_kind() != Some(SymbolKind::Class) => {
                // Object literal methods are not declarations
                self.visit_children(node, source, scope, depth);
            }
            "method_definition" | "method_signature" | "abstract_method_signature" => {
                let kind = scope.function_kind();
                self.visit_declaration(node, node, "name", kind, source, scope, depth);
            }
            "field_definition" => self.record_field(node, "property", source, scope),
            "public_field_definition" | "property_signature" => {
                self.record_field(node, "name", source, scope)
            }
            "variable_declarator" => self.visit_declarator(node, source, scope, depth),
            // Static initialisation blocks hold statements, not members
            "class_static_block" => {}
            "import_statement" => {
                if scope.records_bindings() {
                    self.record_imports(node, source, scope);
                }
            }
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

    /// Record `decl` under the name in `name_field` and visit its body in
    /// the new scope. `span` is the node whose extent the record covers.
    #[allow(clippy::too_many_arguments)]
    fn visit_declaration(
        &self,
        decl: Node,
        span: Node,
        name_field: &str,
        kind: SymbolKind,
        source: &[u8],
        scope: &mut ScopeBuilder,
        depth: usize,
    ) {
        let name = decl
            .child_by_field_name(name_field)
            .map(|n| property_name(&n, source))
            .unwrap_or("");
        self.visit_named(decl, span, name, kind, source, scope, depth);
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_named(
        &self,
        decl: Node,
        span: Node,
        name: &str,
        kind: SymbolKind,
        source: &[u8],
        scope: &mut ScopeBuilder,
        depth: usize,
    ) {
        let id = scope.add(name, kind, &span);
        let Some(body) = decl.child_by_field_name("body") else {
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

    fn record_field(&self, node: Node, name_field: &str, source: &[u8], scope: &mut ScopeBuilder) {
        if !scope.records_bindings() {
            return;
        }
        if let Some(name) = node.child_by_field_name(name_field) {
            scope.add(property_name(&name, source), SymbolKind::Variable, &node);
        }
    }

    /// `const x = ...`: functions and classes bound to a plain name are
    /// recorded under that name; other values are variables.
    fn visit_declarator(&self, node: Node, source: &[u8], scope: &mut ScopeBuilder, depth: usize) {
        let Some(target) = node.child_by_field_name("name") else {
            return;
        };
        let value = node.child_by_field_name("value");

        if target.kind() == "identifier" {
            let name = node_text(&target, source);
            match value.map(|v| (v, v.kind())) {
                Some((value, "arrow_function" | "function_expression" | "function"
                    | "generator_function")) => {
                    let kind = scope.function_kind();
                    self.visit_named(value, node, name, kind, source, scope, depth);
                    return;
                }
                Some((value, "class")) => {
                    self.visit_named(value, node, name, SymbolKind::Class, source, scope, depth);
                    return;
                }
                _ => {}
            }
        }

        if scope.records_bindings() {
            self.record_pattern(target, node, source, scope);
        }
        if let Some(value) = value {
            self.visit(value, source, scope, depth + 1);
        }
    }

    /// Record every name bound by a declarator target, destructuring included.
    fn record_pattern(&self, target: Node, declarator: Node, source: &[u8], scope: &mut ScopeBuilder) {
        match target.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => {
                scope.add(node_text(&target, source), SymbolKind::Variable, &declarator);
            }
            "pair_pattern" => {
                if let Some(value) = target.child_by_field_name("value") {
                    self.record_pattern(value, declarator, source, scope);
                }
            }
            "assignment_pattern" | "object_assignment_pattern" => {
                if let Some(left) = target.child_by_field_name("left") {
                    self.record_pattern(left, declarator, source, scope);
                }
            }
            "object_pattern" | "array_pattern" | "rest_pattern" => {
                for child in named_children(&target) {
                    self.record_pattern(child, declarator, source, scope);
                }
            }
            _ => {}
        }
    }

    fn record_imports(&self, node: Node, source: &[u8], scope: &mut ScopeBuilder) {
        let Some(clause) = named_children(&node)
            .into_iter()
            .find(|child| child.kind() == "import_clause")
        else {
            // Side-effect import: `import "./styles.css"`
            return;
        };

        for binding in named_children(&clause) {
            match binding.kind() {
                "identifier" => {
                    scope.add(node_text(&binding, source), SymbolKind::Import, &binding);
                }
                "namespace_import" => {
                    if let Some(alias) = named_children(&binding)
                        .into_iter()
                        .find(|n| n.kind() == "identifier")
                    {
                        scope.add(node_text(&alias, source), SymbolKind::Import, &binding);
                    }
                }
                "named_imports" => {
                    for specifier in named_children(&binding) {
                        if specifier.kind() != "import_specifier" {
                            continue;
                        }
                        let bound = specifier
                            .child_by_field_name("alias")
                            .or_else(|| specifier.child_by_field_name("name"))
                            .map(|n| property_name(&n, source))
                            .unwrap_or("");
                        scope.add(bound, SymbolKind::Import, &specifier);
                    }
                }
                _ => {}
            }
        }
    }
}

/// Name text without the quotes of string-literal keys.
fn property_name<'s>(node: &Node, source: &'s [u8]) -> &'s str {
    node_text(node, source).trim_matches(|c| c == '"' || c == '\'' || c == '`')
}
