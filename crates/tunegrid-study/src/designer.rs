//! Random search over a flat search space.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StudyError, StudyResult};
use crate::parameter::{ParameterConfig, ParameterDomain, ParameterValue, ScaleType};
use crate::search_space::SearchSpace;
use crate::trial::{Trial, TrialId};

/// Parameter assignments proposed for a new trial.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrialSuggestion {
    pub parameters: BTreeMap<String, ParameterValue>,
}

impl TrialSuggestion {
    pub fn to_trial(&self, id: TrialId) -> Trial {
        Trial {
            id,
            parameters: self.parameters.clone(),
            ..Trial::default()
        }
    }
}

/// Samples every parameter independently and uniformly in its scaled domain.
pub struct RandomDesigner {
    parameters: Vec<ParameterConfig>,
    rng: StdRng,
}

impl RandomDesigner {
    /// Fails with [`StudyError::NonFlatSearchSpace`] if `space` has children,
    /// or if a log-scaled double has a non-positive lower bound.
    pub fn new(space: &SearchSpace, seed: u64) -> StudyResult<Self> {
        if space.is_conditional() {
            return Err(StudyError::NonFlatSearchSpace("RandomDesigner"));
        }
        for config in space.parameters() {
            if let ParameterDomain::Double { min, .. } = config.domain {
                let logarithmic = matches!(
                    config.scale_type,
                    Some(ScaleType::Log) | Some(ScaleType::ReverseLog)
                );
                if logarithmic && min <= 0.0 {
                    return Err(StudyError::InvalidParameter {
                        name: config.name.clone(),
                        reason: format!("log scale requires a positive lower bound, got {min}"),
                    });
                }
            }
        }
        Ok(Self {
            parameters: space.parameters().to_vec(),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Produce `count` suggestions; `None` or zero yields one.
    pub fn suggest(&mut self, count: Option<usize>) -> Vec<TrialSuggestion> {
        let count = count.unwrap_or(1).max(1);
        let suggestions: Vec<TrialSuggestion> = (0..count)
            .map(|_| TrialSuggestion {
                parameters: self
                    .parameters
                    .iter()
                    .map(|config| (config.name.clone(), sample(config, &mut self.rng)))
                    .collect(),
            })
            .collect();
        debug!(count, parameters = self.parameters.len(), "random suggestions");
        suggestions
    }
}

fn sample<R: Rng>(config: &ParameterConfig, rng: &mut R) -> ParameterValue {
    match &config.domain {
        ParameterDomain::Double { min, max } => {
            let (min, max) = (*min, *max);
            let value = match config.scale_type {
                Some(ScaleType::Log) => log_uniform(rng, min, max),
                Some(ScaleType::ReverseLog) => min + max - log_uniform(rng, min, max),
                _ => rng.random_range(min..=max),
            };
            ParameterValue::Float(value.clamp(min, max))
        }
        ParameterDomain::Integer { min, max } => ParameterValue::Int(rng.random_range(*min..=*max)),
        ParameterDomain::Discrete { feasible_points } => {
            let idx = rng.random_range(0..feasible_points.len());
            ParameterValue::Float(feasible_points[idx])
        }
        ParameterDomain::Categorical { categories } => {
            let idx = rng.random_range(0..categories.len());
            ParameterValue::Str(categories[idx].clone())
        }
    }
}

fn log_uniform<R: Rng>(rng: &mut R, min: f64, max: f64) -> f64 {
    let (lo, hi) = (min.ln(), max.ln());
    (lo + rng.random::<f64>() * (hi - lo)).exp()
}
