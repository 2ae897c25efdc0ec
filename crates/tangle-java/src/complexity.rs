use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, StreamingIterator};

use tangle_core::types::{ClassMetrics, MethodMetrics, QualifiedName};

/// Declarations that count as "the class" of a source file.
const CLASS_KINDS: &[&str] = &["class_declaration", "enum_declaration", "record_declaration"];

/// Per-method size and complexity metrics for Java sources.
///
/// Each file is parsed on its own. Unresolved types and syntax errors do not
/// stop analysis; tree-sitter recovers and the rest of the file is scored.
pub struct MethodComplexityAnalyzer {
    language: Language,
    package_query: Query,
}

impl MethodComplexityAnalyzer {
    pub fn new() -> Result<Self> {
        let language: Language = tree_sitter_java::LANGUAGE.into();

        let package_query = Query::new(
            &language,
            r#"
            (program
              (package_declaration
                [(scoped_identifier) (identifier)] @package))
            "#,
        )
        .context("failed to compile package query")?;

        Ok(Self {
            language,
            package_query,
        })
    }

    /// Analyze the file at `path`. A missing file, or one without a class
    /// declaration, yields `Ok(None)`.
    pub fn analyze(&self, path: &Path) -> Result<Option<ClassMetrics>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "source file not found");
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()))
            }
        };
        let metrics = self.analyze_source(&content)?;
        if metrics.is_none() {
            debug!(path = %path.display(), "no class declaration found");
        }
        Ok(metrics)
    }

    /// Analyze Java source text.
    pub fn analyze_source(&self, content: &str) -> Result<Option<ClassMetrics>> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .context("failed to set Java language")?;
        let tree = parser
            .parse(content, None)
            .context("failed to parse Java file")?;
        let root = tree.root_node();

        let Some(class) = first_class(root) else {
            return Ok(None);
        };
        let Some(name) = class.child_by_field_name("name") else {
            return Ok(None);
        };
        let simple = node_text(name, content);
        let qualified = match self.package_name(root, content) {
            Some(package) => format!("{package}.{simple}"),
            None => simple.to_string(),
        };

        let mut metrics = ClassMetrics::new(QualifiedName::new(qualified));
        for method in member_methods(class) {
            metrics.methods.push(method_metrics(method, content));
        }
        Ok(Some(metrics))
    }

    fn package_name<'a>(&self, root: Node, content: &'a str) -> Option<&'a str> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.package_query, root, content.as_bytes());
        let m = matches.next()?;
        m.captures.first().map(|c| node_text(c.node, content))
    }
}

fn first_class(root: Node) -> Option<Node> {
    let mut cursor = root.walk();
    let found = root
        .named_children(&mut cursor)
        .find(|child| CLASS_KINDS.contains(&child.kind()));
    found
}

/// Method declarations of a class, record or enum body, in source order.
fn member_methods(class: Node) -> Vec<Node> {
    let Some(body) = class.child_by_field_name("body") else {
        return Vec::new();
    };

    let mut methods = Vec::new();
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        match member.kind() {
            "method_declaration" => methods.push(member),
            // Enum constants come first; methods live in a trailing section.
            "enum_body_declarations" => {
                let mut inner = member.walk();
                methods.extend(
                    member
                        .named_children(&mut inner)
                        .filter(|m| m.kind() == "method_declaration"),
                );
            }
            _ => {}
        }
    }
    methods
}

fn method_metrics(method: Node, content: &str) -> MethodMetrics {
    let name = method
        .child_by_field_name("name")
        .map(|n| node_text(n, content).to_string())
        .unwrap_or_default();

    let parameter_count = method
        .child_by_field_name("parameters")
        .map(|params| {
            let mut cursor = params.walk();
            let count = params
                .named_children(&mut cursor)
                .filter(|p| matches!(p.kind(), "formal_parameter" | "spread_parameter"))
                .count();
            count
        })
        .unwrap_or(0);

    let body = method.child_by_field_name("body");
    let statement_count = body.map(statement_count).unwrap_or(0);
    let cyclomatic_complexity = 1 + body.map(decision_points).unwrap_or(0);

    MethodMetrics {
        name,
        parameter_count,
        statement_count,
        cyclomatic_complexity,
    }
}

/// Immediate statements of a block. Nested blocks count as one statement.
fn statement_count(block: Node) -> usize {
    let mut cursor = block.walk();
    let count = block
        .named_children(&mut cursor)
        .filter(|child| !is_comment(child))
        .count();
    count
}

fn is_comment(node: &Node) -> bool {
    matches!(node.kind(), "line_comment" | "block_comment")
}

/// Syntax constructs relevant to cyclomatic complexity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Construct {
    If,
    For,
    While,
    DoWhile,
    CaseLabel,
    Ternary,
    Binary,
    Other,
}

impl Construct {
    fn of(node: &Node) -> Self {
        match node.kind() {
            "if_statement" => Construct::If,
            "for_statement" => Construct::For,
            "while_statement" => Construct::While,
            "do_statement" => Construct::DoWhile,
            "switch_label" => Construct::CaseLabel,
            "ternary_expression" => Construct::Ternary,
            "binary_expression" => Construct::Binary,
            _ => Construct::Other,
        }
    }
}

/// Decision points in `node` and everything below it.
///
/// Lambdas and local or anonymous classes inside the body are included.
/// Walks with an explicit work stack; long operator chains nest thousands deep.
fn decision_points(node: Node) -> usize {
    let mut total = 0;
    let mut pending = vec![node];
    while let Some(node) = pending.pop() {
        total += match Construct::of(&node) {
            Construct::If
            | Construct::For
            | Construct::While
            | Construct::DoWhile
            | Construct::CaseLabel
            | Construct::Ternary => 1,
            Construct::Binary => usize::from(is_short_circuit(&node)),
            Construct::Other => 0,
        };
        let mut cursor = node.walk();
        pending.extend(node.named_children(&mut cursor));
    }
    total
}

fn is_short_circuit(node: &Node) -> bool {
    node.child_by_field_name("operator")
        .is_some_and(|op| matches!(op.kind(), "&&" | "||"))
}

/// Extract text from a tree-sitter node.
fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}
