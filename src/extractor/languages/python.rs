//! Python symbol visitor.
//!
//! Records: class_definition, function_definition (plain, async, decorated),
//! module/class-level assignments and import bindings.

use tree_sitter::Node;

use super::{within_depth, LanguageExtractor};
use crate::extractor::{named_children, node_text, ScopeBuilder};
use crate::symbol::SymbolKind;

/// Python language symbol visitor.
pub struct PythonExtractor;

impl LanguageExtractor for PythonExtractor {
    fn language_id(&self) -> &'static str {
        "python"
    }

    fn collect(&self, root: Node, source: &[u8], scope: &mut ScopeBuilder) {
        self.visit_children(root, source, scope, 0);
    }

    fn target_node_types(&self) -> &[&'static str] {
        &[
            "class_definition",
            "function_definition",
            "decorated_definition",
            "assignment",
            "import_statement",
            "import_from_statement",
        ]
    }
}

impl PythonExtractor {
    fn visit(&self, node: Node, source: &[u8], scope: &mut ScopeBuilder, depth: usize) {
        if !within_depth(&node, depth, scope) {
            return;
        }

        match node.kind() {
            "class_definition" => self.visit_class(node, node, source, scope, depth),
            "function_definition" => self.visit_function(node, node, source, scope, depth),
            "decorated_definition" => {
                // The decorators belong to the symbol's span
                match node.child_by_field_name("definition") {
                    Some(def) if def.kind() == "class_definition" => {
                        self.visit_class(def, node, source, scope, depth)
                    }
                    Some(def) if def.kind() == "function_definition" => {
                        self.visit_function(def, node, source, scope, depth)
                    }
                    _ => self.visit_children(node, source, scope, depth),
                }
            }
            "assignment" => {
                if scope.records_bindings() {
                    if let Some(left) = node.child_by_field_name("left") {
                        self.record_targets(left, node, source, scope);
                    }
                }
                // Chained assignments nest on the right-hand side
                self.visit_children(node, source, scope, depth);
            }
            "import_statement" | "import_from_statement" => {
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

    fn visit_class(
        &self,
        def: Node,
        span: Node,
        source: &[u8],
        scope: &mut ScopeBuilder,
        depth: usize,
    ) {
        let name = def
            .child_by_field_name("name")
            .map(|n| node_text(&n, source))
            .unwrap_or("");
        self.visit_scoped(def, span, name, SymbolKind::Class, source, scope, depth);
    }

    fn visit_function(
        &self,
        def: Node,
        span: Node,
        source: &[u8],
        scope: &mut ScopeBuilder,
        depth: usize,
    ) {
        let name = def
            .child_by_field_name("name")
            .map(|n| node_text(&n, source))
            .unwrap_or("");
        let kind = scope.function_kind();
        self.visit_scoped(def, span, name, kind, source, scope, depth);
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_scoped(
        &self,
        def: Node,
        span: Node,
        name: &str,
        kind: SymbolKind,
        source: &[u8],
        scope: &mut ScopeBuilder,
        depth: usize,
    ) {
        let id = scope.add(name, kind, &span);
        let Some(body) = def.child_by_field_name("body") else {
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

    /// Record every plain name bound by an assignment target.
    fn record_targets(&self, target: Node, statement: Node, source: &[u8], scope: &mut ScopeBuilder) {
        match target.kind() {
            "identifier" => {
                scope.add(node_text(&target, source), SymbolKind::Variable, &statement);
            }
            "pattern_list" | "tuple_pattern" | "list_pattern" | "list_splat_pattern" => {
                for child in named_children(&target) {
                    self.record_targets(child, statement, source, scope);
                }
            }
            // Attribute and subscript targets bind no new name
            _ => {}
        }
    }

    fn record_imports(&self, node: Node, source: &[u8], scope: &mut ScopeBuilder) {
        let mut cursor = node.walk();
        let names: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();

        for name in names {
            let bound = match name.kind() {
                "aliased_import" => name
                    .child_by_field_name("alias")
                    .or_else(|| name.child_by_field_name("name"))
                    .map(|n| node_text(&n, source))
                    .unwrap_or(""),
                // `import os.path` binds `os`
                "dotted_name" => name
                    .named_child(0)
                    .map(|first| node_text(&first, source))
                    .unwrap_or(""),
                _ => node_text(&name, source),
            };
            scope.add(bound, SymbolKind::Import, &name);
        }
    }
}
