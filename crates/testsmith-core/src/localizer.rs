//! Change localization: which methods an edit touched, and the reduced
//! snippet (imports, type shape, touched methods) sent in place of the file.
//!
//! The diff is positional: line `i` of the new text is changed when it differs
//! from line `i` of the old text. An insertion therefore marks every following
//! line as changed.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::Result;
use crate::parser::{MethodBoundaryParser, MethodSpan, SourceTree, Span};

/// Before/after content of one file and the lines that differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    pub old_text: String,
    pub new_text: String,
    /// 1-based line numbers of the new text that changed.
    pub changed_lines: BTreeSet<usize>,
}

impl ChangeSet {
    pub fn new(old_text: impl Into<String>, new_text: impl Into<String>) -> Self {
        let old_text = old_text.into();
        let new_text = new_text.into();
        let changed_lines = changed_lines(&old_text, &new_text);
        Self {
            old_text,
            new_text,
            changed_lines,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changed_lines.is_empty()
    }
}

/// Positional line diff. Returns 1-based line numbers of `new` that differ.
pub fn changed_lines(old: &str, new: &str) -> BTreeSet<usize> {
    let old_lines: Vec<&str> = old.split('\n').collect();
    new.split('\n')
        .enumerate()
        .filter(|(i, line)| old_lines.get(*i) != Some(line))
        .map(|(i, _)| i + 1)
        .collect()
}

/// Methods of `source` whose span intersects `changed`, in source order.
pub fn affected_methods(
    source: &str,
    changed: &BTreeSet<usize>,
    parser: &dyn MethodBoundaryParser,
) -> Result<Vec<MethodSpan>> {
    let tree = parser.parse(source)?;
    Ok(affected_in_tree(parser, &tree, changed))
}

/// Builds the region for `affected` methods of `source`.
pub fn build_region(
    source: &str,
    affected: &[MethodSpan],
    parser: &dyn MethodBoundaryParser,
) -> Result<AffectedRegion> {
    let tree = parser.parse(source)?;
    Ok(region_from_tree(source, &tree, affected))
}

/// Parses the new text once and returns its region, or `None` when no
/// method was touched.
pub fn localize(change: &ChangeSet, parser: &dyn MethodBoundaryParser) -> Result<Option<AffectedRegion>> {
    let tree = parser.parse(&change.new_text)?;
    let affected = affected_in_tree(parser, &tree, &change.changed_lines);
    debug!(
        changed = change.changed_lines.len(),
        affected = affected.len(),
        "Localized change"
    );
    if affected.is_empty() {
        return Ok(None);
    }
    Ok(Some(region_from_tree(&change.new_text, &tree, &affected)))
}

fn affected_in_tree(
    parser: &dyn MethodBoundaryParser,
    tree: &SourceTree,
    changed: &BTreeSet<usize>,
) -> Vec<MethodSpan> {
    parser
        .method_spans(tree)
        .into_iter()
        .filter(|m| !m.span.is_empty() && changed.range(m.span.start..=m.span.end).next().is_some())
        .collect()
}

fn region_from_tree(source: &str, tree: &SourceTree, affected: &[MethodSpan]) -> AffectedRegion {
    let lines: Vec<&str> = source.split('\n').collect();
    let imports = span_texts(&lines, tree.imports.iter().copied());
    let methods = span_texts(&lines, affected.iter().map(|m| m.span));
    let method_names = affected.iter().map(|m| m.name.clone()).collect();

    match tree.primary_type() {
        Some(decl) => AffectedRegion {
            imports,
            type_header: Some(decl.header.clone()),
            fields: span_texts(&lines, decl.fields.iter().copied()),
            constructors: span_texts(&lines, decl.constructors.iter().copied()),
            methods,
            method_names,
        },
        None => AffectedRegion {
            imports,
            type_header: None,
            fields: Vec::new(),
            constructors: Vec::new(),
            methods,
            method_names,
        },
    }
}

fn span_texts(lines: &[&str], spans: impl Iterator<Item = Span>) -> Vec<String> {
    spans
        .map(|span| {
            let start = span.start.saturating_sub(1).min(lines.len());
            let end = span.end.min(lines.len()).max(start);
            lines[start..end].join("\n")
        })
        .collect()
}

/// Synthesized snippet sent to the generation backend instead of a large file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffectedRegion {
    /// Top-level import/using directives.
    pub imports: Vec<String>,
    /// Header of the first top-level type, without its opening brace.
    pub type_header: Option<String>,
    pub fields: Vec<String>,
    pub constructors: Vec<String>,
    /// Full text of each affected method.
    pub methods: Vec<String>,
    pub method_names: Vec<String>,
}

impl AffectedRegion {
    /// Renders the region as source text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for import in &self.imports {
            out.push_str(import);
            out.push('\n');
        }
        if !self.imports.is_empty() {
            out.push('\n');
        }

        let Some(header) = &self.type_header else {
            if !self.methods.is_empty() {
                out.push_str(&self.methods.join("\n\n"));
                out.push('\n');
            }
            return out;
        };

        out.push_str(header);
        out.push_str("\n{\n");
        for field in &self.fields {
            out.push_str(field);
            out.push('\n');
        }
        for member in self.constructors.iter().chain(&self.methods) {
            out.push('\n');
            out.push_str(member);
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CFamilyParser;

    fn service(body_line: &str) -> String {
        format!(
            "using System;\n\
             \n\
             public class Calc\n\
             {{\n\
             \x20   private int _seed = 1;\n\
             \n\
             \x20   public Calc(int seed)\n\
             \x20   {{\n\
             \x20       _seed = seed;\n\
             \x20   }}\n\
             \n\
             \x20   public int Add(int a, int b)\n\
             \x20   {{\n\
             \x20       {}\n\
             \x20   }}\n\
             \n\
             \x20   public int Neg(int a)\n\
             \x20   {{\n\
             \x20       return -a;\n\
             \x20   }}\n\
             }}\n",
            body_line
        )
    }

    #[test]
    fn test_changed_lines_equal_texts() {
        assert!(changed_lines("a\nb\nc", "a\nb\nc").is_empty());
        assert!(changed_lines("", "").is_empty());
    }

    #[test]
    fn test_changed_lines_single_edit() {
        let lines = changed_lines("a\nb\nc", "a\nB\nc");
        assert_eq!(lines.into_iter().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_changed_lines_insertion_shifts_rest() {
        let lines = changed_lines("a\nb\nc", "a\nx\nb\nc");
        assert_eq!(lines.into_iter().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_changed_lines_within_bounds() {
        let cases = [("a\nb", "a\nb\nc\nd"), ("a\nb\nc\nd", "z"), ("", "x\ny")];
        for (old, new) in cases {
            let max = old.split('\n').count().max(new.split('\n').count());
            for line in changed_lines(old, new) {
                assert!((1..=max).contains(&line), "{} out of bounds", line);
            }
        }
    }

    #[test]
    fn test_affected_methods() {
        let old = service("return a + b;");
        let new = service("return checked(a + b);");
        let changed = changed_lines(&old, &new);
        assert_eq!(changed.iter().copied().collect::<Vec<_>>(), vec![14]);

        let parser = CFamilyParser::csharp();
        let affected = affected_methods(&new, &changed, &parser).unwrap();
        assert_eq!(affected.len(), 1);
        assert_eq!(affected[0].name, "Add");
    }

    #[test]
    fn test_change_outside_methods_affects_nothing() {
        let old = service("return a + b;");
        let new = old.replace("private int _seed = 1;", "private int _seed = 2;");
        let change = ChangeSet::new(old, new);
        assert!(!change.is_empty());

        let parser = CFamilyParser::csharp();
        assert!(localize(&change, &parser).unwrap().is_none());
    }

    #[test]
    fn test_build_region() {
        let source = service("return a + b;");
        let parser = CFamilyParser::csharp();
        let tree = parser.parse(&source).unwrap();
        let neg: Vec<MethodSpan> = parser
            .method_spans(&tree)
            .into_iter()
            .filter(|m| m.name == "Neg")
            .collect();

        let region = build_region(&source, &neg, &parser).unwrap();
        assert_eq!(region.imports, vec!["using System;"]);
        assert_eq!(region.type_header.as_deref(), Some("public class Calc"));
        assert_eq!(region.fields, vec!["    private int _seed = 1;"]);
        assert_eq!(region.constructors.len(), 1);
        assert_eq!(region.method_names, vec!["Neg"]);

        let rendered = region.render();
        assert!(rendered.starts_with("using System;\n\npublic class Calc\n{\n"));
        assert!(rendered.contains("public Calc(int seed)"));
        assert!(rendered.contains("return -a;"));
        assert!(!rendered.contains("public int Add"));
        assert!(rendered.ends_with("}\n"));
    }

    #[test]
    fn test_build_region_without_type() {
        let parser = CFamilyParser::csharp();
        let region = build_region("using System;\nusing System.IO;\n", &[], &parser).unwrap();
        assert!(region.type_header.is_none());
        assert_eq!(region.imports.len(), 2);
        assert_eq!(region.render(), "using System;\nusing System.IO;\n\n");
    }
}
