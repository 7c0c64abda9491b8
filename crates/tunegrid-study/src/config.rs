//! study.toml configuration parser and the `StudyConfig` it produces.
//!
//! ```toml
//! [study]
//! algorithm = "random_search"
//!
//! [[metrics]]
//! name = "accuracy"
//! goal = "maximize"
//!
//! [[parameters]]
//! name = "model"
//! type = "categorical"
//! categories = ["linear", "dnn"]
//!
//! [[parameters.children]]
//! name = "layers"
//! type = "integer"
//! min = 1
//! max = 4
//! parent_values = ["dnn"]
//!
//! [[metadata]]
//! ns = "designer"
//! key = "seed"
//! value = "7"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tunegrid_metadata::{Metadata, MetadataEntry};

use crate::error::StudyResult;
use crate::parameter::ParameterConfig;
use crate::resolve::{resolve_trial, ResolvedValue};
use crate::search_space::SearchSpace;
use crate::trial::Trial;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Unspecified,
    #[default]
    GaussianProcessBandit,
    GridSearch,
    RandomSearch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationNoise {
    #[default]
    Unspecified,
    Low,
    High,
}

/// Values may be added to this enum, never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveMetricGoal {
    Maximize,
    Minimize,
}

impl ObjectiveMetricGoal {
    pub fn is_maximize(&self) -> bool {
        matches!(self, ObjectiveMetricGoal::Maximize)
    }
}

/// An objective (or safety) metric of the study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricInformation {
    pub name: String,
    pub goal: ObjectiveMetricGoal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
}

impl MetricInformation {
    pub fn new(name: impl Into<String>, goal: ObjectiveMetricGoal) -> Self {
        Self {
            name: name.into(),
            goal,
            safety_threshold: None,
            min_value: None,
            max_value: None,
        }
    }
}

/// Early-stopping policy for unpromising trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AutomatedStoppingConfig {
    /// Stop when the predicted final objective, extrapolated from the
    /// learning curve, is unlikely to beat the best trial.
    DecayCurve {
        #[serde(default)]
        use_elapsed_duration: bool,
    },
    /// Stop when the objective falls below the running median of
    /// completed trials at the same step.
    Median {
        #[serde(default)]
        use_elapsed_duration: bool,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudySection {
    #[serde(default)]
    pub algorithm: Algorithm,
    #[serde(default)]
    pub observation_noise: ObservationNoise,
}

/// On-disk shape of a study configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudyConfigDoc {
    #[serde(default)]
    pub study: StudySection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automated_stopping: Option<AutomatedStoppingConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<MetricInformation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataEntry>,
}

/// A study's search space, objectives, algorithm choice and metadata.
///
/// `Clone` shares `metadata` with the original (see [`Metadata`]); use
/// [`StudyConfig::detached`] for a fully independent copy.
#[derive(Debug, Clone, Default)]
pub struct StudyConfig {
    pub search_space: SearchSpace,
    pub algorithm: Algorithm,
    pub metric_information: Vec<MetricInformation>,
    pub observation_noise: ObservationNoise,
    pub automated_stopping: Option<AutomatedStoppingConfig>,
    pub metadata: Metadata,
}

impl StudyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a parsed document. The search space is validated and
    /// metrics are sorted by name.
    pub fn from_doc(doc: StudyConfigDoc) -> StudyResult<Self> {
        let mut metric_information = doc.metrics;
        metric_information.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self {
            search_space: SearchSpace::from_parameters(doc.parameters)?,
            algorithm: doc.study.algorithm,
            metric_information,
            observation_noise: doc.study.observation_noise,
            automated_stopping: doc.automated_stopping,
            metadata: Metadata::from_entries(doc.metadata),
        })
    }

    pub fn to_doc(&self) -> StudyConfigDoc {
        StudyConfigDoc {
            study: StudySection {
                algorithm: self.algorithm,
                observation_noise: self.observation_noise,
            },
            automated_stopping: self.automated_stopping,
            metrics: self.metric_information.clone(),
            parameters: self.search_space.parameters().to_vec(),
            metadata: self.metadata.to_entries(),
        }
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let doc: StudyConfigDoc = toml::from_str(content)?;
        Ok(Self::from_doc(doc)?)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("invalid study config {}", path.display()))
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(&self.to_doc())?)
    }

    /// A copy whose metadata no longer shares storage with `self`.
    pub fn detached(&self) -> Self {
        Self {
            metadata: self.metadata.deep_copy(),
            ..self.clone()
        }
    }

    pub fn is_single_objective(&self) -> bool {
        self.metric_information.len() == 1
    }

    /// Name of the only metric, if the study has exactly one.
    pub fn single_objective_metric_name(&self) -> Option<&str> {
        match self.metric_information.as_slice() {
            [only] => Some(only.name.as_str()),
            _ => None,
        }
    }

    /// The trial's parameters cast to external types, with multi-dimensional
    /// parameters combined into sequences.
    pub fn trial_parameters(&self, trial: &Trial) -> StudyResult<BTreeMap<String, ResolvedValue>> {
        resolve_trial(&self.search_space, trial)
    }

    /// Final measurement metrics of a completed, feasible trial.
    ///
    /// Only configured metrics are returned unless `include_all_metrics`.
    /// An unnamed metric is dropped unless it is the single objective.
    pub fn trial_metrics(&self, trial: &Trial, include_all_metrics: bool) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        if !trial.is_completed() || trial.infeasible {
            return metrics;
        }
        let Some(measurement) = &trial.final_measurement else {
            return metrics;
        };
        let single_objective = self.single_objective_metric_name();
        for (name, value) in &measurement.metrics {
            let configured = self.metric_information.iter().any(|m| &m.name == name);
            if !(include_all_metrics || configured) {
                continue;
            }
            if name.is_empty() && single_objective != Some(name.as_str()) {
                continue;
            }
            metrics.insert(name.clone(), *value);
        }
        metrics
    }
}
