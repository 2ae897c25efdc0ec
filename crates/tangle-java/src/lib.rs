//! Java support for tangle: class-file indexing and source metrics.

pub mod classfile;
pub mod complexity;
pub mod indexer;

pub use complexity::MethodComplexityAnalyzer;
pub use indexer::ClassDirIndexer;
