use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tangle_core::analysis::MetricsOutcome;
use tangle_core::builder::ProjectIndex;
use tangle_core::config::{Config, CONFIG_FILE};
use tangle_core::pipeline::ScanPipeline;
use tangle_core::project::Project;
use tangle_core::recent::RecentProjects;
use tangle_core::registry::{write_registry, RegistryFileIndexer};
use tangle_core::source::SourceLocator;
use tangle_core::types::QualifiedName;

use tangle_java::{ClassDirIndexer, MethodComplexityAnalyzer};
use tangle_report::{json, text};

#[derive(Parser)]
#[command(name = "tangle")]
#[command(about = "Find package and class dependency cycles and method complexity in JVM projects")]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,
    /// Config file path (defaults to .tangle.toml next to the project file)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Print JSON on a single line
    #[arg(long, global = true)]
    compact: bool,
    /// Enable debug logging for tangle crates
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy)]
struct Output {
    format: Format,
    compact: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the package graph and its cycles
    Packages {
        /// Project descriptor (JSON)
        project: PathBuf,
        /// Restrict to packages equal to or nested under this prefix
        #[arg(long = "select")]
        select: Vec<String>,
    },
    /// Print the class graph and its cycles for a selection
    Classes {
        /// Project descriptor (JSON)
        project: PathBuf,
        /// Package prefix or fully qualified class name
        #[arg(long = "select")]
        select: Vec<String>,
    },
    /// Print per-method metrics for one class
    Metrics {
        /// Project descriptor (JSON)
        project: PathBuf,
        /// Fully qualified class name
        class: String,
    },
    /// Scan a project and write its classes as a JSON registry
    Export {
        /// Project descriptor (JSON)
        project: PathBuf,
        /// Registry file to write
        output: PathBuf,
    },
    /// Create or edit a project descriptor
    Project {
        #[command(subcommand)]
        action: ProjectCommand,
    },
    /// List or prune recently opened projects
    Recent {
        #[command(subcommand)]
        action: RecentCommand,
    },
    /// Create a default .tangle.toml configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Write a new, empty project descriptor
    New {
        file: PathBuf,
        /// Project name (defaults to the file stem)
        #[arg(long)]
        name: Option<String>,
        /// Overwrite an existing descriptor
        #[arg(long)]
        force: bool,
    },
    /// Add artifact paths or source roots to a descriptor
    Add {
        file: PathBuf,
        /// Class directory, .class file or JSON registry
        #[arg(long = "artifact")]
        artifacts: Vec<PathBuf>,
        /// Java source root
        #[arg(long = "source")]
        sources: Vec<PathBuf>,
    },
    /// Remove artifact paths or source roots from a descriptor
    Remove {
        file: PathBuf,
        #[arg(long = "artifact")]
        artifacts: Vec<PathBuf>,
        #[arg(long = "source")]
        sources: Vec<PathBuf>,
    },
    /// Print a project descriptor
    Show { file: PathBuf },
}

#[derive(Subcommand)]
enum RecentCommand {
    /// Print the recent-project list
    List,
    /// Drop a project from the list
    Forget { file: PathBuf },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = Output {
        format: cli.format,
        compact: cli.compact,
    };
    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Packages { project, select } => {
            cmd_packages(&project, &select, config_path, output)
        }
        Commands::Classes { project, select } => {
            cmd_classes(&project, &select, config_path, output)
        }
        Commands::Metrics { project, class } => cmd_metrics(&project, &class, output),
        Commands::Export { project, output } => cmd_export(&project, &output, config_path),
        Commands::Project { action } => cmd_project(action, config_path, output),
        Commands::Recent { action } => cmd_recent(action, config_path, output),
        Commands::Init { force } => cmd_init(force),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(2);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,tangle=debug,tangle_core=debug,tangle_java=debug"
    } else {
        "warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn cmd_packages(
    project_file: &Path,
    select: &[String],
    config_path: Option<&Path>,
    output: Output,
) -> Result<()> {
    let config = load_config(project_file, config_path)?;
    let project = open_project(project_file)?;
    let index = scan(&project, &config)?;

    let analysis = index.analyze_packages(select);
    info!(
        classes = index.class_count(),
        project_edges = index.package_graph().edge_count(),
        packages = analysis.graph.node_count(),
        cycles = analysis.cycles.len(),
        "package analysis complete"
    );
    emit(output, &analysis, text::format_packages)
}

fn cmd_classes(
    project_file: &Path,
    select: &[String],
    config_path: Option<&Path>,
    output: Output,
) -> Result<()> {
    let config = load_config(project_file, config_path)?;
    let project = open_project(project_file)?;
    let index = scan(&project, &config)?;

    let analysis = index.analyze_classes(select);
    if !analysis.collisions.is_empty() {
        warn!(
            collisions = analysis.collisions.len(),
            "classes with the same simple name share one graph node"
        );
    }
    info!(
        classes = analysis.graph.node_count(),
        cycles = analysis.cycles.len(),
        "class analysis complete"
    );
    emit(output, &analysis, text::format_classes)
}

fn cmd_metrics(project_file: &Path, class: &str, output: Output) -> Result<()> {
    let project = open_project(project_file)?;
    let class = QualifiedName::new(class);

    let locator = SourceLocator::new(project.source_paths.iter().cloned());
    if locator.roots().is_empty() {
        warn!(project = %project.name, "project has no source roots");
    }
    let outcome = match locator.locate(&class) {
        None => MetricsOutcome::SourceNotFound { class },
        Some(source) => {
            let analyzer =
                MethodComplexityAnalyzer::new().context("failed to initialize Java analyzer")?;
            match analyzer.analyze(&source)? {
                Some(metrics) => MetricsOutcome::Found { source, metrics },
                None => MetricsOutcome::NoClassDeclaration { class, source },
            }
        }
    };
    emit(output, &outcome, text::format_metrics)
}

fn cmd_export(project_file: &Path, target: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(project_file, config_path)?;
    let project = open_project(project_file)?;
    let registry = pipeline(&config)
        .scan(&project.artifact_paths)
        .with_context(|| format!("failed to scan project '{}'", project.name))?;
    write_registry(target, &registry)?;
    println!("Wrote {} classes to {}.", registry.len(), target.display());
    Ok(())
}

fn cmd_project(action: ProjectCommand, config_path: Option<&Path>, output: Output) -> Result<()> {
    match action {
        ProjectCommand::New { file, name, force } => {
            if file.exists() && !force {
                anyhow::bail!(
                    "{} already exists. Use --force to overwrite.",
                    file.display()
                );
            }
            let name = match name {
                Some(name) => name,
                None => file
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .context("cannot derive a project name; pass --name")?,
            };
            let project = Project::new(name);
            project.save(&file)?;
            remember(&file, &load_config(&file, config_path)?);
            println!("Created project '{}' in {}.", project.name, file.display());
            Ok(())
        }
        ProjectCommand::Add {
            file,
            artifacts,
            sources,
        } => {
            let config = load_config(&file, config_path)?;
            let mut project = load_remembered(&file, &config)?;
            for path in artifacts {
                project.add_artifact_path(path);
            }
            for path in sources {
                project.add_source_path(path);
            }
            project.save(&file)?;
            emit(output, &project, text::format_project)
        }
        ProjectCommand::Remove {
            file,
            artifacts,
            sources,
        } => {
            let config = load_config(&file, config_path)?;
            let mut project = load_remembered(&file, &config)?;
            for path in &artifacts {
                project.remove_artifact_path(path);
            }
            for path in &sources {
                project.remove_source_path(path);
            }
            project.save(&file)?;
            emit(output, &project, text::format_project)
        }
        ProjectCommand::Show { file } => {
            let config = load_config(&file, config_path)?;
            let project = load_remembered(&file, &config)?;
            emit(output, &project, text::format_project)
        }
    }
}

fn cmd_recent(action: RecentCommand, config_path: Option<&Path>, output: Output) -> Result<()> {
    let config = match config_path {
        Some(p) => Config::load(p)?,
        None => Config::load_or_default(Path::new(".")),
    };
    let Some(recent_file) = &config.recent.file else {
        anyhow::bail!("no recent-project list configured; set [recent] file in {CONFIG_FILE}");
    };
    let mut recent = RecentProjects::load(recent_file, config.recent.max_entries)?;
    match action {
        RecentCommand::List => emit(output, &recent, text::format_recent),
        RecentCommand::Forget { file } => {
            if recent.forget(&recent_key(&file)) {
                recent.save(recent_file)?;
                println!("Forgot {}.", file.display());
            } else {
                println!("{} is not in the recent list.", file.display());
            }
            Ok(())
        }
    }
}

fn cmd_init(force: bool) -> Result<()> {
    let target = PathBuf::from(CONFIG_FILE);
    if target.exists() && !force {
        anyhow::bail!("{CONFIG_FILE} already exists. Use --force to overwrite.");
    }
    std::fs::write(&target, Config::default_toml())
        .with_context(|| format!("failed to write {CONFIG_FILE}"))?;
    println!("Created {CONFIG_FILE} with default configuration.");
    Ok(())
}

fn project_dir(project_file: &Path) -> &Path {
    match project_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

fn load_config(project_file: &Path, config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(p) => Config::load(p),
        None => Ok(Config::load_or_default(project_dir(project_file))),
    }
}

/// Load a descriptor with its paths resolved against the descriptor's directory.
fn open_project(project_file: &Path) -> Result<Project> {
    let project = Project::load(project_file)?.resolved(project_dir(project_file));
    debug!(
        name = %project.name,
        artifacts = project.artifact_paths.len(),
        sources = project.source_paths.len(),
        "opened project"
    );
    Ok(project)
}

/// Load a descriptor for editing. Success moves it to the front of the recent
/// list; a descriptor that cannot be read is dropped from it.
fn load_remembered(project_file: &Path, config: &Config) -> Result<Project> {
    match Project::load(project_file) {
        Ok(project) => {
            remember(project_file, config);
            Ok(project)
        }
        Err(e) => {
            update_recent(config, |recent| {
                recent.forget(&recent_key(project_file));
            });
            Err(e)
        }
    }
}

fn pipeline(config: &Config) -> ScanPipeline {
    ScanPipeline::new(
        vec![
            Box::new(RegistryFileIndexer::new()),
            Box::new(ClassDirIndexer::new()),
        ],
        config,
    )
}

fn scan(project: &Project, config: &Config) -> Result<ProjectIndex> {
    pipeline(config)
        .analyze(&project.artifact_paths)
        .with_context(|| format!("failed to scan project '{}'", project.name))
}

/// Record the project in the recent list, if one is configured.
fn remember(project_file: &Path, config: &Config) {
    let path = recent_key(project_file);
    update_recent(config, |recent| recent.touch(&path));
}

/// Absolute form of a descriptor path. Works for files that no longer exist.
fn recent_key(project_file: &Path) -> PathBuf {
    std::path::absolute(project_file).unwrap_or_else(|_| project_file.to_path_buf())
}

fn update_recent(config: &Config, change: impl FnOnce(&mut RecentProjects)) {
    let Some(recent_file) = &config.recent.file else {
        return;
    };
    let result = RecentProjects::load(recent_file, config.recent.max_entries).and_then(
        |mut recent| {
            change(&mut recent);
            recent.save(recent_file)
        },
    );
    if let Err(e) = result {
        warn!(path = %recent_file.display(), "failed to update recent projects: {e:#}");
    }
}

fn emit<T: Serialize>(output: Output, value: &T, render: fn(&T) -> String) -> Result<()> {
    match output.format {
        Format::Text => print!("{}", render(value)),
        Format::Json => {
            let out =
                json::format(value, output.compact).context("failed to serialize output")?;
            println!("{out}");
        }
    }
    Ok(())
}
