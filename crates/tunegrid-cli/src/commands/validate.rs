use std::fmt::Write as _;
use std::path::Path;

use tunegrid_study::{RandomDesigner, StudyConfig};

pub fn validate(config: &str) -> anyhow::Result<()> {
    let study = match StudyConfig::from_file(Path::new(config)) {
        Ok(study) => study,
        Err(e) => {
            eprintln!("✗ {config}: {e:#}");
            return Err(e);
        }
    };
    println!("✓ {config}");
    print!("{}", summarize(&study));
    Ok(())
}

pub fn summarize(study: &StudyConfig) -> String {
    let space = &study.search_space;
    let mut out = String::new();
    let _ = writeln!(out, "  algorithm: {:?}", study.algorithm);
    let _ = writeln!(
        out,
        "  parameters: {} ({} root{})",
        space.all_parameters().len(),
        space.parameters().len(),
        if space.is_conditional() { ", conditional" } else { "" }
    );
    for metric in &study.metric_information {
        let _ = writeln!(out, "  metric: {} ({:?})", metric.name, metric.goal);
    }
    if let Some(stopping) = &study.automated_stopping {
        let _ = writeln!(out, "  automated stopping: {stopping:?}");
    }
    let _ = writeln!(out, "  metadata namespaces: {}", study.metadata.namespaces().len());
    if let Err(e) = RandomDesigner::new(space, 0) {
        let _ = writeln!(out, "  note: {e}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_summary_flat() {
        let study = StudyConfig::from_toml_str(
            "[[metrics]]\nname = \"acc\"\ngoal = \"maximize\"\n\n[[parameters]]\nname = \"lr\"\ntype = \"double\"\nmin = 0.0\nmax = 1.0\n",
        )
        .unwrap();
        let summary = summarize(&study);
        assert!(summary.contains("parameters: 1 (1 root)"));
        assert!(summary.contains("metric: acc (Maximize)"));
        assert!(!summary.contains("note:"));
    }

    #[test]
    fn test_summary_conditional() {
        let study = StudyConfig::from_toml_str(
            r#"
[[parameters]]
name = "model"
type = "categorical"
categories = ["a", "b"]

[[parameters.children]]
name = "depth"
type = "integer"
min = 1
max = 3
parent_values = ["b"]
"#,
        )
        .unwrap();
        let summary = summarize(&study);
        assert!(summary.contains("parameters: 2 (1 root, conditional)"));
        assert!(summary.contains("does not support conditional search spaces"));
    }

    #[test]
    fn test_validate_rejects_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("study.toml");
        fs::write(&path, "[study]\nalgorithm = \"bogus\"\n").unwrap();
        assert!(validate(path.to_str().unwrap()).is_err());
    }
}
