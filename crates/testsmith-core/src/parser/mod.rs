//! Method-boundary parsers.
//!
//! A parser turns source text into a [`SourceTree`]: import directives, type
//! declarations and the line spans of their members. Parsers are looked up by
//! file extension through a [`ParserRegistry`]; an extension without a parser
//! is a configuration error, reported before any file is processed.

mod c_family;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{CoreError, Result};

pub use c_family::CFamilyParser;

/// Inclusive, 1-based line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns true if `line` falls inside the span.
    pub fn contains(&self, line: usize) -> bool {
        self.start <= line && line <= self.end
    }

    /// Number of lines covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// A method (or constructor) and where it sits in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpan {
    pub name: String,
    pub span: Span,
    /// Declared with a `public` modifier.
    pub is_public: bool,
}

impl MethodSpan {
    pub fn new(name: impl Into<String>, start: usize, end: usize, is_public: bool) -> Self {
        Self {
            name: name.into(),
            span: Span::new(start, end),
            is_public,
        }
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }
}

/// Kind of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Struct,
    Record,
    Interface,
    Enum,
}

impl TypeKind {
    /// Whether instances of this kind carry testable behaviour.
    pub fn is_concrete(&self) -> bool {
        matches!(self, Self::Class | Self::Struct | Self::Record)
    }
}

/// A type declaration with its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    /// Declaration header up to (not including) the opening brace,
    /// whitespace-collapsed and without attributes.
    pub header: String,
    pub span: Span,
    /// Declared inside another type.
    pub nested: bool,
    pub fields: Vec<Span>,
    pub constructors: Vec<Span>,
    pub methods: Vec<MethodSpan>,
}

/// Structural view of one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTree {
    /// Top-level import/using directives.
    pub imports: Vec<Span>,
    /// Type declarations in source order, nested types included.
    pub types: Vec<TypeDecl>,
    /// Total number of lines in the source.
    pub line_count: usize,
}

impl SourceTree {
    /// The first type that is not nested in another.
    pub fn primary_type(&self) -> Option<&TypeDecl> {
        self.types.iter().find(|t| !t.nested)
    }

    /// Every method of every type, in source order.
    pub fn methods(&self) -> Vec<&MethodSpan> {
        let mut methods: Vec<&MethodSpan> = self.types.iter().flat_map(|t| &t.methods).collect();
        methods.sort_by_key(|m| m.span.start);
        methods
    }
}

/// Finds method boundaries in one language.
pub trait MethodBoundaryParser: Send + Sync {
    /// Short language name, for logs.
    fn language(&self) -> &'static str;

    /// Parses `source` into a tree.
    fn parse(&self, source: &str) -> Result<SourceTree>;

    /// Returns true if `source` declares an interface (or protocol).
    fn declares_interface(&self, source: &str) -> bool;

    /// All method spans in source order.
    fn method_spans(&self, tree: &SourceTree) -> Vec<MethodSpan> {
        tree.methods().into_iter().cloned().collect()
    }

    /// Names of public methods declared on concrete types.
    fn public_method_names(&self, tree: &SourceTree) -> Vec<String> {
        tree.types
            .iter()
            .filter(|t| t.kind.is_concrete())
            .flat_map(|t| &t.methods)
            .filter(|m| m.is_public)
            .map(|m| m.name.clone())
            .collect()
    }
}

/// Parsers keyed by lowercase extension (with the leading dot).
#[derive(Clone)]
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn MethodBoundaryParser>>,
}

impl ParserRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// A registry with the built-in C# and Java parsers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(".cs", Arc::new(CFamilyParser::csharp()));
        registry.register(".java", Arc::new(CFamilyParser::java()));
        registry
    }

    /// Registers (or replaces) the parser for `extension`.
    pub fn register(&mut self, extension: &str, parser: Arc<dyn MethodBoundaryParser>) {
        self.parsers.insert(normalize_extension(extension), parser);
    }

    /// Looks up the parser for `extension`.
    pub fn for_extension(&self, extension: &str) -> Result<Arc<dyn MethodBoundaryParser>> {
        let key = normalize_extension(extension);
        self.parsers
            .get(&key)
            .cloned()
            .ok_or(CoreError::UnsupportedLanguage(key))
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.parsers.keys().cloned().collect();
        extensions.sort();
        extensions
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}

fn normalize_extension(extension: &str) -> String {
    let ext = extension.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}
