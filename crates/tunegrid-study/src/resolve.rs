//! Trial parameter resolution against a (possibly conditional) search space.
//!
//! Resolution walks the search space breadth first. A root parameter is
//! matched whenever the trial assigns it; a child is matched only if its
//! parent was matched and the parent's raw value is one of the child's
//! matching parent values. Matched values are cast to the parameter's
//! external type, and `name[i]` elements are then folded into one sequence
//! per base name.

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{StudyError, StudyResult};
use crate::parameter::{ParameterConfig, ParameterValue};
use crate::search_space::{parse_multi_dimensional_parameter_name, SearchSpace};
use crate::trial::Trial;

/// An externally typed parameter value, or the elements of a
/// multi-dimensional parameter ordered by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResolvedValue {
    Scalar(ParameterValue),
    Sequence(Vec<ParameterValue>),
}

impl ResolvedValue {
    pub fn as_scalar(&self) -> Option<&ParameterValue> {
        match self {
            ResolvedValue::Scalar(v) => Some(v),
            ResolvedValue::Sequence(_) => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[ParameterValue]> {
        match self {
            ResolvedValue::Sequence(v) => Some(v),
            ResolvedValue::Scalar(_) => None,
        }
    }
}

/// Resolve `trial`'s parameters. See [`resolve_parameters`].
pub fn resolve_trial(space: &SearchSpace, trial: &Trial) -> StudyResult<BTreeMap<String, ResolvedValue>> {
    resolve_parameters(space, &trial.id.to_string(), &trial.parameters)
}

/// Resolve raw parameter assignments into external values.
///
/// Fails with [`StudyError::ParametersNotInSearchSpace`] if any raw
/// parameter cannot be matched (unknown name, inactive child, or child of an
/// unassigned parent), and with [`StudyError::Cast`] if a matched value has
/// no representation in its external type. No partial result is returned.
pub fn resolve_parameters(
    space: &SearchSpace,
    trial: &str,
    raw: &BTreeMap<String, ParameterValue>,
) -> StudyResult<BTreeMap<String, ResolvedValue>> {
    let external = external_values(space, trial, raw)?;
    if external.len() != raw.len() {
        let unresolved: Vec<String> = raw
            .keys()
            .filter(|name| !external.contains_key(*name))
            .cloned()
            .collect();
        warn!(%trial, ?unresolved, "trial parameters not present in search space");
        return Err(StudyError::ParametersNotInSearchSpace {
            trial: trial.to_string(),
            unresolved,
        });
    }
    Ok(combine_multi_dimensional(external))
}

/// Breadth-first match of raw values, cast to external types.
fn external_values(
    space: &SearchSpace,
    trial: &str,
    raw: &BTreeMap<String, ParameterValue>,
) -> StudyResult<BTreeMap<String, ParameterValue>> {
    let mut remaining = raw.clone();
    let mut resolved_raw: HashMap<&str, ParameterValue> = HashMap::new();
    let mut external: BTreeMap<String, ParameterValue> = BTreeMap::new();
    let mut queue: VecDeque<(Option<&str>, &ParameterConfig)> =
        space.parameters().iter().map(|pc| (None, pc)).collect();

    while !remaining.is_empty() {
        let Some((parent, config)) = queue.pop_front() else {
            break;
        };
        queue.extend(
            config
                .children
                .iter()
                .map(|child| (Some(config.name.as_str()), child)),
        );

        let Some(value) = remaining.get(&config.name).cloned() else {
            continue;
        };
        if let Some(parent) = parent {
            let Some(parent_value) = resolved_raw.get(parent) else {
                continue;
            };
            if !config.is_active_under(parent_value) {
                debug!(%trial, parameter = %config.name, %parent, "inactive under parent value");
                continue;
            }
        }

        let external_value = match config.external_type {
            Some(target) => value.cast(target).ok_or_else(|| StudyError::Cast {
                name: config.name.clone(),
                value: value.clone(),
                target,
            })?,
            None => value.clone(),
        };
        remaining.remove(&config.name);
        external.insert(config.name.clone(), external_value);
        resolved_raw.insert(config.name.as_str(), value);
    }

    debug!(%trial, resolved = external.len(), unresolved = remaining.len(), "trial parameters matched");
    Ok(external)
}

/// Fold `base[i]` entries into one sequence per base, ordered by index.
///
/// Missing indices are not padded; the sequence holds exactly the indices
/// present.
fn combine_multi_dimensional(external: BTreeMap<String, ParameterValue>) -> BTreeMap<String, ResolvedValue> {
    let mut out = BTreeMap::new();
    let mut multi_dim: BTreeMap<String, Vec<(usize, ParameterValue)>> = BTreeMap::new();
    for (name, value) in external {
        match parse_multi_dimensional_parameter_name(&name) {
            Some((base, index)) => multi_dim
                .entry(base.to_string())
                .or_default()
                .push((index, value)),
            None => {
                out.insert(name, ResolvedValue::Scalar(value));
            }
        }
    }
    for (base, mut elements) in multi_dim {
        elements.sort_by_key(|(index, _)| *index);
        let values = elements.into_iter().map(|(_, v)| v).collect();
        out.insert(base, ResolvedValue::Sequence(values));
    }
    out
}
