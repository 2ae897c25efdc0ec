use std::path::{Path, PathBuf};

use crate::types::QualifiedName;

/// File suffix of Java source files.
pub const SOURCE_SUFFIX: &str = "java";

/// Resolves classes to source files under a list of source roots.
#[derive(Debug, Clone, Default)]
pub struct SourceLocator {
    roots: Vec<PathBuf>,
}

impl SourceLocator {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
        }
    }

    /// Relative path a class is expected at: "com/example/User.java".
    pub fn relative_path(class: &QualifiedName) -> PathBuf {
        let mut path: PathBuf = class.as_str().split('.').collect();
        path.set_extension(SOURCE_SUFFIX);
        path
    }

    /// First existing source file for `class`, in root order.
    pub fn locate(&self, class: &QualifiedName) -> Option<PathBuf> {
        let relative = Self::relative_path(class);
        self.roots
            .iter()
            .map(|root| root.join(&relative))
            .find(|candidate| candidate.is_file())
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl<P: AsRef<Path>> FromIterator<P> for SourceLocator {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|p| p.as_ref().to_path_buf()))
    }
}
