use std::fmt::Display;

use colored::Colorize;

use tangle_core::analysis::{ClassAnalysis, MetricsOutcome, PackageAnalysis};
use tangle_core::cycles::Cycle;
use tangle_core::graph::DependencyGraph;
use tangle_core::project::Project;
use tangle_core::recent::RecentProjects;
use tangle_core::types::ClassMetrics;

/// Complexity above which a method is flagged.
const HIGH_COMPLEXITY: usize = 10;
const MODERATE_COMPLEXITY: usize = 5;

/// Format a package analysis for terminal output.
pub fn format_packages(analysis: &PackageAnalysis) -> String {
    let mut out = header("tangle - Package Dependencies");

    out.push_str(&format!(
        "{}: {} packages ({} classes), {} dependencies\n",
        "Summary".bold(),
        analysis.graph.node_count(),
        analysis.class_count,
        analysis.graph.edge_count(),
    ));
    out.push_str(&format_graph(&analysis.graph));
    out.push_str(&format_cycles(&analysis.cycles));
    out.push('\n');
    out
}

/// Format a class analysis for terminal output.
pub fn format_classes(analysis: &ClassAnalysis) -> String {
    let mut out = header("tangle - Class Dependencies");

    out.push_str(&format!(
        "{}: {} classes selected, {} nodes, {} dependencies\n",
        "Summary".bold(),
        analysis.selected_count,
        analysis.graph.node_count(),
        analysis.graph.edge_count(),
    ));

    if !analysis.collisions.is_empty() {
        out.push_str(&format!(
            "\n{} (merged into one node each)\n",
            "Simple name collisions".yellow().bold()
        ));
        for (simple, classes) in &analysis.collisions {
            let names: Vec<String> = classes.iter().map(ToString::to_string).collect();
            out.push_str(&format!("  {simple}: {}\n", names.join(", ")));
        }
    }

    out.push_str(&format_graph(&analysis.graph));
    out.push_str(&format_cycles(&analysis.cycles));
    out.push('\n');
    out
}

/// Format the result of a metrics request.
pub fn format_metrics(outcome: &MetricsOutcome) -> String {
    match outcome {
        MetricsOutcome::Found { source, metrics } => {
            let mut out = header("tangle - Method Metrics");
            out.push_str(&format!("{}: {}\n", "Class".bold(), metrics.class_name));
            out.push_str(&format!("{}: {}\n", "Source".bold(), source.display()));
            out.push_str(&format_method_table(metrics));
            out.push('\n');
            out
        }
        MetricsOutcome::SourceNotFound { class } => {
            format!("{}: {class}\n", "Source file not found for class".yellow())
        }
        MetricsOutcome::NoClassDeclaration { class, source } => format!(
            "{}: {} (expected {class})\n",
            "No class declaration in".yellow(),
            source.display()
        ),
    }
}

/// Format a project descriptor.
pub fn format_project(project: &Project) -> String {
    let mut out = format!("{}: {}\n", "Project".bold(), project.name);
    out.push_str("  Artifacts:\n");
    if project.artifact_paths.is_empty() {
        out.push_str("    (none)\n");
    }
    for path in &project.artifact_paths {
        out.push_str(&format!("    {}\n", path.display()));
    }
    out.push_str("  Source roots:\n");
    if project.source_paths.is_empty() {
        out.push_str("    (none)\n");
    }
    for path in &project.source_paths {
        out.push_str(&format!("    {}\n", path.display()));
    }
    out
}

/// Recently opened projects, most recent first.
pub fn format_recent(recent: &RecentProjects) -> String {
    if recent.entries().is_empty() {
        return "No recent projects.\n".to_string();
    }
    let mut out = format!("{}\n", "Recent projects".bold());
    for (i, path) in recent.entries().iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, path.display()));
    }
    out
}

fn header(title: &str) -> String {
    format!("\n{}\n{}\n\n", title.bold(), "=".repeat(40))
}

fn format_graph<N: Ord + Clone + Display>(graph: &DependencyGraph<N>) -> String {
    let mut out = format!("\n{}\n{}\n", "Dependencies".bold(), "-".repeat(40));
    for node in graph.nodes() {
        let targets: Vec<String> = graph
            .successors(node)
            .into_iter()
            .flatten()
            .map(ToString::to_string)
            .collect();
        if targets.is_empty() {
            out.push_str(&format!("  {node}\n"));
        } else {
            out.push_str(&format!("  {node} -> {}\n", targets.join(", ")));
        }
    }
    out
}

fn format_cycles<N: Display + PartialEq>(cycles: &[Cycle<N>]) -> String {
    if cycles.is_empty() {
        return format!("\n{}\n", "No cycles found!".green().bold());
    }

    let mut out = format!(
        "\n{} ({} found)\n{}\n",
        "Cycles".red().bold(),
        cycles.len(),
        "-".repeat(40),
    );
    for (i, cycle) in cycles.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, cycle_path(cycle)));
    }
    out
}

/// "a -> b -> c -> a"
pub fn cycle_path<N: Display + PartialEq>(cycle: &Cycle<N>) -> String {
    let mut parts: Vec<String> = cycle.nodes().iter().map(ToString::to_string).collect();
    if let Some(first) = parts.first().cloned() {
        parts.push(first);
    }
    parts.join(" -> ")
}

fn format_method_table(metrics: &ClassMetrics) -> String {
    let mut out = format!(
        "\n  {:<32} {:>6} {:>10} {:>10}\n",
        "Method", "Params", "Statements", "Complexity"
    );
    out.push_str(&format!("  {}\n", "-".repeat(61)));

    if metrics.methods.is_empty() {
        out.push_str("  (no methods)\n");
        return out;
    }

    for method in &metrics.methods {
        let complexity = format!("{:>10}", method.cyclomatic_complexity);
        let complexity = if method.cyclomatic_complexity > HIGH_COMPLEXITY {
            complexity.red().bold()
        } else if method.cyclomatic_complexity > MODERATE_COMPLEXITY {
            complexity.yellow()
        } else {
            complexity.normal()
        };
        out.push_str(&format!(
            "  {:<32} {:>6} {:>10} {}\n",
            method.name, method.parameter_count, method.statement_count, complexity
        ));
    }

    out.push_str(&format!(
        "\n  Total complexity: {}\n",
        metrics.total_complexity()
    ));
    if let Some(worst) = metrics.max_complexity() {
        out.push_str(&format!(
            "  Most complex: {} ({})\n",
            worst.name, worst.cyclomatic_complexity
        ));
    }
    out
}
