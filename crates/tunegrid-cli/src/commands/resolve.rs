use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tunegrid_study::{ResolvedValue, StudyConfig, Trial, TrialId};

use crate::Format;

/// One trial or a batch.
#[derive(Deserialize)]
#[serde(untagged)]
enum TrialFile {
    Many(Vec<Trial>),
    One(Trial),
}

#[derive(Debug, Serialize)]
pub struct ResolvedTrial {
    pub id: TrialId,
    pub parameters: BTreeMap<String, ResolvedValue>,
}

pub fn resolve(config: &str, trial: &str, format: Format) -> anyhow::Result<()> {
    let study = StudyConfig::from_file(Path::new(config))?;
    let trials = load_trials(Path::new(trial))?;
    let resolved = resolve_all(&study, &trials)?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&resolved)?),
        Format::Text => print!("{}", format_resolved(&resolved)),
    }
    Ok(())
}

pub fn load_trials(path: &Path) -> anyhow::Result<Vec<Trial>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file: TrialFile = serde_json::from_str(&content)
        .with_context(|| format!("invalid trial file {}", path.display()))?;
    Ok(match file {
        TrialFile::Many(trials) => trials,
        TrialFile::One(trial) => vec![trial],
    })
}

pub fn resolve_all(study: &StudyConfig, trials: &[Trial]) -> anyhow::Result<Vec<ResolvedTrial>> {
    trials
        .iter()
        .map(|trial| {
            let parameters = study.trial_parameters(trial)?;
            Ok(ResolvedTrial { id: trial.id, parameters })
        })
        .collect()
}

pub fn format_resolved(resolved: &[ResolvedTrial]) -> String {
    let mut out = String::new();
    for trial in resolved {
        let _ = writeln!(out, "trial {}", trial.id);
        for (name, value) in &trial.parameters {
            let rendered = match value {
                ResolvedValue::Scalar(v) => v.to_string(),
                ResolvedValue::Sequence(vs) => {
                    let items: Vec<String> = vs.iter().map(ToString::to_string).collect();
                    format!("[{}]", items.join(", "))
                }
            };
            let _ = writeln!(out, "  {name} = {rendered}");
        }
    }
    out
}
