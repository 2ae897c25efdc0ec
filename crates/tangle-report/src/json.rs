use serde::Serialize;

/// Format any analysis result as JSON.
pub fn format<T: Serialize>(value: &T, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangle_core::analysis::{MetricsOutcome, PackageAnalysis};
    use tangle_core::cycles::Cycle;
    use tangle_core::graph::PackageGraph;
    use tangle_core::types::{ClassMetrics, MethodMetrics, PackageName, QualifiedName};

    fn pkg(name: &str) -> PackageName {
        PackageName::new(name)
    }

    fn sample_packages() -> PackageAnalysis {
        let graph: PackageGraph = [(pkg("a"), pkg("b")), (pkg("b"), pkg("a"))]
            .into_iter()
            .collect();
        PackageAnalysis {
            selected: vec![pkg("a"), pkg("b")],
            class_count: 3,
            graph,
            cycles: vec![Cycle(vec![pkg("b"), pkg("a")])],
        }
    }

    #[test]
    fn test_package_analysis_is_valid_json() {
        let json = format(&sample_packages(), false).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("should be valid JSON");
        assert_eq!(parsed["selected"], serde_json::json!(["a", "b"]));
        assert_eq!(parsed["graph"]["a"], serde_json::json!(["b"]));
        assert_eq!(parsed["cycles"], serde_json::json!([["b", "a"]]));
    }

    #[test]
    fn test_compact_is_single_line() {
        let json = format(&sample_packages(), true).unwrap();
        assert!(!json.contains('\n'), "compact JSON should be single line");
    }

    #[test]
    fn test_pretty_is_multiline() {
        let json = format(&sample_packages(), false).unwrap();
        assert!(json.contains('\n'), "pretty JSON should be multiline");
    }

    #[test]
    fn test_metrics_outcome() {
        let mut metrics = ClassMetrics::new(QualifiedName::new("a.B"));
        metrics.methods.push(MethodMetrics {
            name: "run".to_string(),
            parameter_count: 1,
            statement_count: 2,
            cyclomatic_complexity: 3,
        });
        let outcome = MetricsOutcome::Found {
            source: "src/a/B.java".into(),
            metrics,
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&format(&outcome, true).unwrap()).unwrap();
        assert_eq!(parsed["status"], "found");
        assert_eq!(parsed["metrics"]["class_name"], "a.B");
        assert_eq!(parsed["metrics"]["methods"][0]["cyclomatic_complexity"], 3);
    }
}
