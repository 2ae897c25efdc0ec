pub mod analysis;
pub mod analyzer;
pub mod builder;
pub mod config;
pub mod cycles;
pub mod error;
pub mod filter;
pub mod graph;
pub mod pipeline;
pub mod project;
pub mod recent;
pub mod registry;
pub mod source;
pub mod types;

pub use analysis::{ClassAnalysis, MetricsOutcome, PackageAnalysis};
pub use analyzer::{ArtifactIndexer, ClassRegistry};
pub use builder::{ClassSelection, DependencyGraphBuilder, ProjectIndex};
pub use config::Config;
pub use cycles::{Cycle, CycleDetector};
pub use error::{ScanError, ScanResult};
pub use filter::NamespaceFilter;
pub use graph::{ClassGraph, DependencyGraph, PackageGraph};
pub use pipeline::ScanPipeline;
pub use project::Project;
pub use recent::RecentProjects;
pub use source::SourceLocator;
pub use types::*;
