use serde::{Deserialize, Serialize};

/// Namespaces that belong to the platform rather than the analyzed project.
pub const DEFAULT_EXCLUDED_PREFIXES: &[&str] = &["java.", "javax.", "sun.", "com.sun."];

/// Decides which names belong to the analyzed project.
///
/// A name is in scope iff it starts with none of the excluded prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceFilter {
    excluded_prefixes: Vec<String>,
}

impl NamespaceFilter {
    pub fn new<I, S>(excluded_prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_prefixes: excluded_prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_project(&self, name: &str) -> bool {
        !self
            .excluded_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }

    pub fn excluded_prefixes(&self) -> &[String] {
        &self.excluded_prefixes
    }
}

impl Default for NamespaceFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_PREFIXES.iter().copied())
    }
}
