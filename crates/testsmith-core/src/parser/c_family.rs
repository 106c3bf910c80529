//! Tree-sitter backed parser for C# and Java.
//!
//! Only declarations are read: top-level imports, type declarations (nested
//! ones included) and their fields, constructors and methods. Member bodies
//! are never visited. Line numbers are 1-based and refer to the original
//! source.

use tracing::debug;
use tree_sitter::{Language, Node, Parser, Tree};

use super::{MethodBoundaryParser, MethodSpan, SourceTree, Span, TypeDecl, TypeKind};
use crate::error::{CoreError, Result};

/// Member nodes kept as fields (C# properties and events included).
const FIELD_KINDS: &[&str] = &[
    "field_declaration",
    "property_declaration",
    "event_field_declaration",
];
const CONSTRUCTOR_KINDS: &[&str] = &["constructor_declaration", "compact_constructor_declaration"];
/// Nodes that never start a type header.
const HEADER_SKIP_KINDS: &[&str] = &[
    "attribute_list",
    "annotation",
    "marker_annotation",
    "comment",
    "line_comment",
    "block_comment",
];

/// Parser for C-family languages.
#[derive(Clone)]
pub struct CFamilyParser {
    language: &'static str,
    grammar: Language,
    import_kind: &'static str,
}

impl CFamilyParser {
    /// Parser for C# (`using` directives).
    pub fn csharp() -> Self {
        Self {
            language: "csharp",
            grammar: tree_sitter_c_sharp::LANGUAGE.into(),
            import_kind: "using_directive",
        }
    }

    /// Parser for Java (`import` declarations).
    pub fn java() -> Self {
        Self {
            language: "java",
            grammar: tree_sitter_java::LANGUAGE.into(),
            import_kind: "import_declaration",
        }
    }

    fn syntax_tree(&self, source: &str) -> Result<Tree> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.grammar)
            .map_err(|e| CoreError::Parse(format!("failed to load {} grammar: {}", self.language, e)))?;
        parser
            .parse(source, None)
            .ok_or_else(|| CoreError::Parse(format!("{} parser returned no tree", self.language)))
    }
}

impl std::fmt::Debug for CFamilyParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CFamilyParser")
            .field("language", &self.language)
            .finish()
    }
}

impl MethodBoundaryParser for CFamilyParser {
    fn language(&self) -> &'static str {
        self.language
    }

    fn parse(&self, source: &str) -> Result<SourceTree> {
        let syntax = self.syntax_tree(source)?;
        let root = syntax.root_node();
        if root.has_error() {
            let line = first_error_line(root).unwrap_or(1);
            return Err(CoreError::Parse(format!(
                "{} syntax error near line {}",
                self.language, line
            )));
        }

        let mut walker = Walker {
            source,
            import_kind: self.import_kind,
            tree: SourceTree {
                line_count: source.split('\n').count(),
                ..SourceTree::default()
            },
        };
        walker.container(root, true);
        debug!(
            language = self.language,
            types = walker.tree.types.len(),
            imports = walker.tree.imports.len(),
            "Parsed source"
        );
        Ok(walker.tree)
    }

    fn declares_interface(&self, source: &str) -> bool {
        match self.syntax_tree(source) {
            Ok(syntax) => contains_kind(syntax.root_node(), "interface_declaration"),
            Err(_) => false,
        }
    }
}

struct Walker<'s> {
    source: &'s str,
    import_kind: &'static str,
    tree: SourceTree,
}

impl Walker<'_> {
    /// Compilation unit or namespace body.
    fn container(&mut self, node: Node<'_>, top_level: bool) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                kind if kind == self.import_kind => {
                    if top_level {
                        self.tree.imports.push(span_of(child));
                    }
                }
                "namespace_declaration" => {
                    if let Some(body) = child.child_by_field_name("body") {
                        self.container(body, false);
                    }
                }
                "file_scoped_namespace_declaration" => self.container(child, false),
                kind => {
                    if let Some(type_kind) = TypeKind::from_node_kind(kind) {
                        self.type_decl(child, type_kind, false);
                    }
                }
            }
        }
    }

    fn type_decl(&mut self, node: Node<'_>, kind: TypeKind, nested: bool) {
        let index = self.tree.types.len();
        let body = node.child_by_field_name("body");
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        let header = self.header(node, body);
        self.tree.types.push(TypeDecl {
            name,
            kind,
            header,
            span: span_of(node),
            nested,
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
        });
        if let Some(body) = body {
            self.members(body, index);
        }
    }

    fn members(&mut self, body: Node<'_>, index: usize) {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            let kind = member.kind();
            if FIELD_KINDS.contains(&kind) {
                self.tree.types[index].fields.push(span_of(member));
            } else if CONSTRUCTOR_KINDS.contains(&kind) {
                self.tree.types[index].constructors.push(span_of(member));
            } else if kind == "method_declaration" {
                if let Some(name) = member.child_by_field_name("name") {
                    let span = span_of(member);
                    let method = MethodSpan::new(self.text(name), span.start, span.end, self.is_public(member));
                    self.tree.types[index].methods.push(method);
                }
            } else if kind == "enum_body_declarations" {
                self.members(member, index);
            } else if let Some(type_kind) = TypeKind::from_node_kind(kind) {
                self.type_decl(member, type_kind, true);
            }
        }
    }

    /// Declaration text up to the body, without attributes or annotations,
    /// whitespace-collapsed.
    fn header(&self, node: Node<'_>, body: Option<Node<'_>>) -> String {
        let start = header_start(node);
        let end = body.map_or(node.end_byte(), |b| b.start_byte());
        let raw = self.source.get(start..end).unwrap_or_default();
        raw.trim_end_matches(|c: char| c == ';' || c.is_whitespace())
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// C# `modifier` nodes or the keywords inside Java's `modifiers`.
    fn is_public(&self, node: Node<'_>) -> bool {
        let mut cursor = node.walk();
        let public = node.children(&mut cursor).any(|child| match child.kind() {
            "modifier" => self.text(child) == "public",
            "modifiers" => {
                let mut inner = child.walk();
                let found = child.children(&mut inner).any(|k| k.kind() == "public");
                found
            }
            _ => false,
        });
        public
    }

    fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or_default()
    }
}

impl TypeKind {
    fn from_node_kind(kind: &str) -> Option<Self> {
        match kind {
            "class_declaration" => Some(Self::Class),
            "struct_declaration" => Some(Self::Struct),
            "record_declaration" | "record_struct_declaration" => Some(Self::Record),
            "interface_declaration" => Some(Self::Interface),
            "enum_declaration" => Some(Self::Enum),
            _ => None,
        }
    }
}

fn span_of(node: Node<'_>) -> Span {
    Span::new(node.start_position().row + 1, node.end_position().row + 1)
}

/// First byte of the declaration proper: past attributes, annotations and
/// leading comments.
fn header_start(node: Node<'_>) -> usize {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if HEADER_SKIP_KINDS.contains(&child.kind()) {
            continue;
        }
        if child.kind() != "modifiers" {
            return child.start_byte();
        }
        // Java folds annotations into `modifiers`.
        let mut inner = child.walk();
        let first = child
            .children(&mut inner)
            .find(|m| !HEADER_SKIP_KINDS.contains(&m.kind()));
        if let Some(first) = first {
            return first.start_byte();
        }
    }
    node.start_byte()
}

fn contains_kind(node: Node<'_>, kind: &str) -> bool {
    if node.kind() == kind {
        return true;
    }
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| contains_kind(child, kind));
    found
}

fn first_error_line(node: Node<'_>) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    let mut cursor = node.walk();
    let line = node
        .children(&mut cursor)
        .filter(|child| child.has_error() || child.is_missing())
        .find_map(first_error_line);
    line
}
