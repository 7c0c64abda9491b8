//! Trials and their measurements.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::parameter::ParameterValue;

/// Unique identifier for a trial within a study.
pub type TrialId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialStatus {
    #[default]
    Requested,
    Active,
    Stopping,
    Completed,
}

/// Metric values reported for a trial.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

impl Measurement {
    pub fn new<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            metrics: metrics.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// One evaluation of a point in the search space.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trial {
    pub id: TrialId,
    /// Raw parameter assignments, keyed by parameter name.
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterValue>,
    #[serde(default)]
    pub status: TrialStatus,
    #[serde(default)]
    pub infeasible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_measurement: Option<Measurement>,
}

impl Trial {
    pub fn new(id: TrialId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Mark completed with `measurement` as the final measurement.
    pub fn complete(mut self, measurement: Measurement) -> Self {
        self.status = TrialStatus::Completed;
        self.final_measurement = Some(measurement);
        self
    }

    /// Mark completed without a usable measurement.
    pub fn complete_infeasible(mut self) -> Self {
        self.status = TrialStatus::Completed;
        self.infeasible = true;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == TrialStatus::Completed
    }
}
