use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::ScanResult;
use crate::types::{ClassDescriptor, QualifiedName};

/// Flat registry of every class an indexer found, keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: BTreeMap<QualifiedName, ClassDescriptor>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class. If the name is already registered the earlier entry is
    /// kept, the same way the first classpath entry shadows later ones.
    /// Returns false when the class was shadowed.
    pub fn insert(&mut self, class: ClassDescriptor) -> bool {
        if self.classes.contains_key(&class.name) {
            return false;
        }
        self.classes.insert(class.name.clone(), class);
        true
    }

    pub fn get(&self, name: &QualifiedName) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.classes.values()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<ClassDescriptor> for ClassRegistry {
    fn from_iter<I: IntoIterator<Item = ClassDescriptor>>(iter: I) -> Self {
        let mut registry = Self::new();
        for class in iter {
            registry.insert(class);
        }
        registry
    }
}

/// Trait that each artifact indexer must implement.
pub trait ArtifactIndexer: Send + Sync {
    /// Short name for logs (e.g., "class-dir", "registry")
    fn name(&self) -> &'static str;

    /// Whether this indexer understands the given artifact path.
    fn accepts(&self, path: &std::path::Path) -> bool;

    /// Index the given paths, in classpath order.
    fn index(&self, paths: &[PathBuf]) -> ScanResult<ClassRegistry>;
}
