use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use walkdir::WalkDir;
use zip::ZipArchive;

use tangle_core::analyzer::{ArtifactIndexer, ClassRegistry};
use tangle_core::error::{ScanError, ScanResult};
use tangle_core::types::ClassDescriptor;

use crate::classfile;

/// Indexes compiled classes from directories, single `.class` files, and
/// `.jar`/`.zip` archives.
#[derive(Debug, Default)]
pub struct ClassDirIndexer;

impl ClassDirIndexer {
    pub fn new() -> Self {
        Self
    }

    fn index_file(path: &Path, registry: &mut ClassRegistry) -> ScanResult<()> {
        let data = std::fs::read(path).map_err(|e| ScanError::io(path, e))?;
        Self::index_bytes(path, &data, registry)
    }

    fn index_bytes(path: &Path, data: &[u8], registry: &mut ClassRegistry) -> ScanResult<()> {
        let class = classfile::parse(data).map_err(|e| malformed(path, e))?;

        if class.is_module {
            trace!(path = %path.display(), "skipping module descriptor");
            return Ok(());
        }
        registry.insert(ClassDescriptor::new(class.name, class.dependencies));
        Ok(())
    }

    fn index_dir(root: &Path, registry: &mut ClassRegistry) -> ScanResult<()> {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                ScanError::io(path, e.into())
            })?;
            if entry.file_type().is_file() && has_extension(entry.path(), "class") {
                Self::index_file(entry.path(), registry)?;
            }
        }
        Ok(())
    }

    /// Class entries in archive order. Entries under `META-INF/` (multi-release
    /// overlays among them) are left out.
    fn index_archive(archive_path: &Path, registry: &mut ClassRegistry) -> ScanResult<()> {
        let file = File::open(archive_path).map_err(|e| ScanError::io(archive_path, e))?;
        let mut archive = ZipArchive::new(file).map_err(|e| malformed(archive_path, e))?;

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| malformed(archive_path, e))?;
            let name = entry.name().to_string();
            if !entry.is_file()
                || name.starts_with("META-INF/")
                || !has_extension(Path::new(&name), "class")
            {
                continue;
            }

            let entry_path = PathBuf::from(format!("{}!/{name}", archive_path.display()));
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|e| ScanError::io(&entry_path, e))?;
            Self::index_bytes(&entry_path, &data, registry)?;
        }
        Ok(())
    }
}

fn malformed(path: &Path, reason: impl ToString) -> ScanError {
    ScanError::MalformedClass {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn is_archive(path: &Path) -> bool {
    has_extension(path, "jar") || has_extension(path, "zip")
}

impl ArtifactIndexer for ClassDirIndexer {
    fn name(&self) -> &'static str {
        "class-dir"
    }

    fn accepts(&self, path: &Path) -> bool {
        path.is_dir() || has_extension(path, "class") || is_archive(path)
    }

    fn index(&self, paths: &[PathBuf]) -> ScanResult<ClassRegistry> {
        let mut registry = ClassRegistry::new();
        for path in paths {
            if !path.exists() {
                return Err(ScanError::MissingPath(path.clone()));
            }
            if path.is_dir() {
                Self::index_dir(path, &mut registry)?;
            } else if is_archive(path) {
                Self::index_archive(path, &mut registry)?;
            } else {
                Self::index_file(path, &mut registry)?;
            }
            debug!(path = %path.display(), total = registry.len(), "indexed class path entry");
        }
        Ok(registry)
    }
}
