use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Package reported for classes declared without a `package` statement.
pub const DEFAULT_PACKAGE: &str = "(default)";

/// Fully qualified class name: "com.example.Outer$Inner"
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifiedName(pub String);

impl QualifiedName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Package portion of the name, or the default package if there is none.
    pub fn package(&self) -> PackageName {
        match self.0.rfind('.') {
            Some(dot) if dot > 0 => PackageName(self.0[..dot].to_string()),
            _ => PackageName(DEFAULT_PACKAGE.to_string()),
        }
    }

    /// Everything after the final '.', nested-type separators included.
    pub fn simple_name(&self) -> SimpleName {
        match self.0.rfind('.') {
            Some(dot) => SimpleName(self.0[dot + 1..].to_string()),
            None => SimpleName(self.0.clone()),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dotted package name: "com.example.domain"
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageName(pub String);

impl PackageName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if this package is `prefix` itself or nested below it.
    pub fn is_within(&self, prefix: &str) -> bool {
        self.0 == prefix
            || (self.0.len() > prefix.len()
                && self.0.starts_with(prefix)
                && self.0.as_bytes()[prefix.len()] == b'.')
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Class name without its package: "Outer$Inner".
///
/// Not unique across packages. Two classes with the same simple name collapse
/// into one class-graph node.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimpleName(pub String);

impl SimpleName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The enclosing type's simple name if this names a nested type.
    pub fn enclosing(&self) -> Option<&str> {
        self.0.rfind('$').map(|dollar| &self.0[..dollar])
    }
}

impl fmt::Display for SimpleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A class found by an indexer, with every class it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: QualifiedName,
    pub package: PackageName,
    pub dependencies: BTreeSet<QualifiedName>,
}

impl ClassDescriptor {
    /// Build a descriptor, deriving the package from the qualified name.
    pub fn new(name: QualifiedName, dependencies: BTreeSet<QualifiedName>) -> Self {
        let package = name.package();
        Self {
            name,
            package,
            dependencies,
        }
    }
}

/// Metrics for a single method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodMetrics {
    pub name: String,
    pub parameter_count: usize,
    pub statement_count: usize,
    pub cyclomatic_complexity: usize,
}

/// Metrics for every method of one class, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class_name: QualifiedName,
    pub methods: Vec<MethodMetrics>,
}

impl ClassMetrics {
    pub fn new(class_name: QualifiedName) -> Self {
        Self {
            class_name,
            methods: Vec::new(),
        }
    }

    pub fn total_complexity(&self) -> usize {
        self.methods.iter().map(|m| m.cyclomatic_complexity).sum()
    }

    pub fn max_complexity(&self) -> Option<&MethodMetrics> {
        self.methods.iter().max_by_key(|m| m.cyclomatic_complexity)
    }
}
