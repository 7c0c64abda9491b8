//! Search spaces — flat or conditional trees of parameter configs.
//!
//! Parameters are added through a [`SearchSpaceSelector`]. The root selector
//! adds top-level parameters; [`SearchSpaceSelector::select`] moves under an
//! existing parameter so that new parameters become its children, active only
//! for the given parent values.
//!
//! ```
//! use tunegrid_study::{ParameterConfig, SearchSpace};
//!
//! let mut space = SearchSpace::new();
//! space.select_root().add_categorical_param("model", ["linear", "dnn"]).unwrap();
//! space
//!     .select_root()
//!     .select("model", ["dnn"])
//!     .unwrap()
//!     .add_param(ParameterConfig::int("layers", 1, 4))
//!     .unwrap();
//! assert!(space.is_conditional());
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{StudyError, StudyResult};
use crate::parameter::{ParameterConfig, ParameterDomain, ParameterValue};

/// Name of element `index` of the multi-dimensional parameter `base`.
pub fn multi_dimensional_parameter_name(base: &str, index: usize) -> String {
    format!("{base}[{index}]")
}

/// Split `base[index]` into its base name and index.
///
/// `None` for names that are not multi-dimensional elements.
pub fn parse_multi_dimensional_parameter_name(name: &str) -> Option<(&str, usize)> {
    let inner = name.strip_suffix(']')?;
    let (base, index) = inner.rsplit_once('[')?;
    if base.is_empty() || index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((base, index.parse().ok()?))
}

/// An ordered collection of root parameter configs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SearchSpace {
    parameters: Vec<ParameterConfig>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and validate a search space from root configs (with children).
    pub fn from_parameters(parameters: Vec<ParameterConfig>) -> StudyResult<Self> {
        let mut space = Self::new();
        for config in parameters {
            space.select_root().add_param(config)?;
        }
        Ok(space)
    }

    /// Root parameter configs, in declared order.
    pub fn parameters(&self) -> &[ParameterConfig] {
        &self.parameters
    }

    pub fn select_root(&mut self) -> SearchSpaceSelector<'_> {
        SearchSpaceSelector {
            configs: &mut self.parameters,
            parent: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// True if any parameter has children.
    pub fn is_conditional(&self) -> bool {
        self.parameters.iter().any(|p| !p.children.is_empty())
    }

    /// Every config in the tree, breadth first.
    pub fn all_parameters(&self) -> Vec<&ParameterConfig> {
        let mut out = Vec::new();
        let mut queue: VecDeque<&ParameterConfig> = self.parameters.iter().collect();
        while let Some(config) = queue.pop_front() {
            queue.extend(config.children.iter());
            out.push(config);
        }
        out
    }

    /// First config named `name`, searching the whole tree breadth first.
    pub fn get(&self, name: &str) -> Option<&ParameterConfig> {
        self.all_parameters().into_iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn parameter_names(&self) -> Vec<&str> {
        self.all_parameters()
            .into_iter()
            .map(|p| p.name.as_str())
            .collect()
    }
}

impl<'de> Deserialize<'de> for SearchSpace {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parameters = Vec::<ParameterConfig>::deserialize(deserializer)?;
        SearchSpace::from_parameters(parameters).map_err(serde::de::Error::custom)
    }
}

/// The parent a selector adds children under.
#[derive(Debug, Clone)]
struct ParentScope {
    name: String,
    values: Vec<ParameterValue>,
}

/// Adds parameters at one position of a search space tree.
pub struct SearchSpaceSelector<'a> {
    configs: &'a mut Vec<ParameterConfig>,
    parent: Option<ParentScope>,
}

impl<'a> SearchSpaceSelector<'a> {
    /// Move under the parameter `parent_name` at this level. Parameters added
    /// through the returned selector are active when the parent takes one of
    /// `parent_values`.
    pub fn select<I, V>(self, parent_name: &str, parent_values: I) -> StudyResult<SearchSpaceSelector<'a>>
    where
        I: IntoIterator<Item = V>,
        V: Into<ParameterValue>,
    {
        let values: Vec<ParameterValue> = parent_values.into_iter().map(Into::into).collect();
        let configs = self.configs;
        let parent = configs
            .iter_mut()
            .find(|p| p.name == parent_name)
            .ok_or_else(|| StudyError::InvalidParameter {
                name: parent_name.to_string(),
                reason: "no such parameter at this level".to_string(),
            })?;

        validate_parent_values(parent, &values)?;
        Ok(SearchSpaceSelector {
            configs: &mut parent.children,
            parent: Some(ParentScope {
                name: parent_name.to_string(),
                values,
            }),
        })
    }

    /// Name of the parameter this selector adds children under.
    pub fn parent_name(&self) -> Option<&str> {
        self.parent.as_ref().map(|p| p.name.as_str())
    }

    /// Validate and add `config` (with any children it already carries).
    ///
    /// Under a parent, the selector's parent values replace the config's
    /// `matching_parent_values`; at the root they are cleared.
    pub fn add_param(&mut self, mut config: ParameterConfig) -> StudyResult<&mut ParameterConfig> {
        let invalid = |reason: String| StudyError::InvalidParameter {
            name: config.name.clone(),
            reason,
        };
        if config.name.is_empty() {
            return Err(invalid("empty parameter name".to_string()));
        }
        if self.configs.iter().any(|p| p.name == config.name) {
            return Err(invalid("duplicate parameter name".to_string()));
        }
        config.domain.validate().map_err(invalid)?;
        if let Some(default) = &config.default_value {
            if !config.domain.contains(default) {
                return Err(invalid(format!("default value {default} is outside the domain")));
            }
        }

        config.matching_parent_values = match &self.parent {
            Some(parent) => parent.values.clone(),
            None => Vec::new(),
        };

        // Children are re-added so they get the same validation.
        let children = std::mem::take(&mut config.children);
        validate_children(&config, &children)?;
        config.children = children;

        self.configs.push(config);
        let index = self.configs.len() - 1;
        Ok(&mut self.configs[index])
    }

    pub fn add_float_param(&mut self, name: &str, min: f64, max: f64) -> StudyResult<&mut ParameterConfig> {
        self.add_param(ParameterConfig::float(name, min, max))
    }

    pub fn add_int_param(&mut self, name: &str, min: i64, max: i64) -> StudyResult<&mut ParameterConfig> {
        self.add_param(ParameterConfig::int(name, min, max))
    }

    pub fn add_discrete_param(&mut self, name: &str, feasible_points: Vec<f64>) -> StudyResult<&mut ParameterConfig> {
        self.add_param(ParameterConfig::discrete(name, feasible_points))
    }

    pub fn add_categorical_param<I, S>(&mut self, name: &str, categories: I) -> StudyResult<&mut ParameterConfig>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_param(ParameterConfig::categorical(name, categories))
    }

    pub fn add_bool_param(&mut self, name: &str) -> StudyResult<&mut ParameterConfig> {
        self.add_param(ParameterConfig::boolean(name))
    }
}

fn validate_parent_values(parent: &ParameterConfig, values: &[ParameterValue]) -> StudyResult<()> {
    let invalid = |reason: String| StudyError::InvalidParameter {
        name: parent.name.clone(),
        reason,
    };
    if matches!(parent.domain, ParameterDomain::Double { .. }) {
        return Err(invalid("double parameters cannot have children".to_string()));
    }
    if values.is_empty() {
        return Err(invalid("no parent values given for child parameters".to_string()));
    }
    if let Some(bad) = values.iter().find(|v| !parent.domain.contains(v)) {
        return Err(invalid(format!("parent value {bad} is outside the domain")));
    }
    Ok(())
}

/// Check already-attached children of `parent`, recursively.
fn validate_children(parent: &ParameterConfig, children: &[ParameterConfig]) -> StudyResult<()> {
    let mut scratch: Vec<ParameterConfig> = Vec::with_capacity(children.len());
    for child in children {
        validate_parent_values(parent, &child.matching_parent_values)?;
        let mut selector = SearchSpaceSelector {
            configs: &mut scratch,
            parent: Some(ParentScope {
                name: parent.name.clone(),
                values: child.matching_parent_values.clone(),
            }),
        };
        selector.add_param(child.clone())?;
    }
    Ok(())
}
