//! Parameter values, domains and configs.
//!
//! A [`ParameterConfig`] is one node of a search space. Its `children` are
//! conditional parameters, each active only when this parameter's value is
//! one of the child's `matching_parent_values`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A raw (internal) or external parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParameterValue {
    /// Numeric view of the value, if it has one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParameterValue::Int(v) => Some(*v as f64),
            ParameterValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Equality where `Int(3)` and `Float(3.0)` are the same value.
    pub fn matches(&self, other: &ParameterValue) -> bool {
        match (self, other) {
            (ParameterValue::Bool(a), ParameterValue::Bool(b)) => a == b,
            (ParameterValue::Str(a), ParameterValue::Str(b)) => a == b,
            (a, b) => match (a.as_float(), b.as_float()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }

    /// Convert to `target`. `None` if the value has no representation there.
    pub fn cast(&self, target: ExternalType) -> Option<ParameterValue> {
        match target {
            ExternalType::Internal => Some(self.clone()),
            ExternalType::Float => match self {
                ParameterValue::Float(_) => Some(self.clone()),
                ParameterValue::Int(v) => Some(ParameterValue::Float(*v as f64)),
                ParameterValue::Str(s) => s.trim().parse().ok().map(ParameterValue::Float),
                ParameterValue::Bool(_) => None,
            },
            ExternalType::Integer => match self {
                ParameterValue::Int(_) => Some(self.clone()),
                ParameterValue::Float(v) => integral(*v),
                ParameterValue::Str(s) => {
                    let s = s.trim();
                    match s.parse::<i64>() {
                        Ok(v) => Some(ParameterValue::Int(v)),
                        Err(_) => s.parse::<f64>().ok().and_then(integral),
                    }
                }
                ParameterValue::Bool(_) => None,
            },
            ExternalType::Boolean => match self {
                ParameterValue::Bool(_) => Some(self.clone()),
                ParameterValue::Str(s) => match s.as_str() {
                    "True" | "true" => Some(ParameterValue::Bool(true)),
                    "False" | "false" => Some(ParameterValue::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
        }
    }
}

fn integral(v: f64) -> Option<ParameterValue> {
    (v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64)
        .then(|| ParameterValue::Int(v as i64))
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Bool(v) => write!(f, "{v}"),
            ParameterValue::Int(v) => write!(f, "{v}"),
            ParameterValue::Float(v) => write!(f, "{v}"),
            ParameterValue::Str(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        ParameterValue::Bool(v)
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        ParameterValue::Int(v)
    }
}

impl From<i32> for ParameterValue {
    fn from(v: i32) -> Self {
        ParameterValue::Int(v.into())
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        ParameterValue::Float(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        ParameterValue::Str(v.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(v: String) -> Self {
        ParameterValue::Str(v)
    }
}

/// The type a raw value is cast to when it leaves the search space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalType {
    Internal,
    Boolean,
    Integer,
    Float,
}

impl fmt::Display for ExternalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExternalType::Internal => "internal",
            ExternalType::Boolean => "boolean",
            ExternalType::Integer => "integer",
            ExternalType::Float => "float",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    Double,
    Integer,
    Discrete,
    Categorical,
}

/// How a numeric domain is scaled for sampling and modelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    Linear,
    Log,
    ReverseLog,
    UniformDiscrete,
}

/// The set of values a parameter can take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParameterDomain {
    /// Continuous range `[min, max]`.
    Double { min: f64, max: f64 },
    /// Integer range `[min, max]`.
    Integer { min: i64, max: i64 },
    /// Finite set of numbers, kept sorted.
    Discrete { feasible_points: Vec<f64> },
    Categorical { categories: Vec<String> },
}

impl ParameterDomain {
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            ParameterDomain::Double { .. } => ParameterType::Double,
            ParameterDomain::Integer { .. } => ParameterType::Integer,
            ParameterDomain::Discrete { .. } => ParameterType::Discrete,
            ParameterDomain::Categorical { .. } => ParameterType::Categorical,
        }
    }

    /// Check the domain is non-empty and well ordered.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ParameterDomain::Double { min, max } => {
                if !(min.is_finite() && max.is_finite()) {
                    return Err(format!("bounds must be finite, got [{min}, {max}]"));
                }
                if min > max {
                    return Err(format!("min {min} is greater than max {max}"));
                }
            }
            ParameterDomain::Integer { min, max } => {
                if min > max {
                    return Err(format!("min {min} is greater than max {max}"));
                }
            }
            ParameterDomain::Discrete { feasible_points } => {
                if feasible_points.is_empty() {
                    return Err("no feasible points".to_string());
                }
                if feasible_points.iter().any(|p| !p.is_finite()) {
                    return Err("feasible points must be finite".to_string());
                }
            }
            ParameterDomain::Categorical { categories } => {
                if categories.is_empty() {
                    return Err("no categories".to_string());
                }
                let mut seen = std::collections::HashSet::new();
                if let Some(dup) = categories.iter().find(|c| !seen.insert(c.as_str())) {
                    return Err(format!("duplicate category {dup:?}"));
                }
            }
        }
        Ok(())
    }

    /// True if `value` lies in the domain.
    pub fn contains(&self, value: &ParameterValue) -> bool {
        match self {
            ParameterDomain::Double { min, max } => {
                value.as_float().is_some_and(|v| v >= *min && v <= *max)
            }
            ParameterDomain::Integer { min, max } => match value.cast(ExternalType::Integer) {
                Some(ParameterValue::Int(v)) if value.as_float().is_some() => {
                    v >= *min && v <= *max
                }
                _ => false,
            },
            ParameterDomain::Discrete { feasible_points } => value
                .as_float()
                .is_some_and(|v| feasible_points.iter().any(|p| *p == v)),
            ParameterDomain::Categorical { categories } => value
                .as_str()
                .is_some_and(|s| categories.iter().any(|c| c == s)),
        }
    }
}

/// One parameter of a search space, with its conditional children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterConfig {
    pub name: String,
    #[serde(flatten)]
    pub domain: ParameterDomain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_type: Option<ScaleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<ParameterValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_type: Option<ExternalType>,
    /// Parent values under which this parameter is active. Empty for roots.
    #[serde(default, rename = "parent_values", skip_serializing_if = "Vec::is_empty")]
    pub matching_parent_values: Vec<ParameterValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParameterConfig>,
}

impl ParameterConfig {
    pub fn new(name: impl Into<String>, domain: ParameterDomain) -> Self {
        Self {
            name: name.into(),
            domain,
            scale_type: None,
            default_value: None,
            external_type: None,
            matching_parent_values: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn float(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self::new(name, ParameterDomain::Double { min, max }).with_external_type(ExternalType::Float)
    }

    pub fn int(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self::new(name, ParameterDomain::Integer { min, max })
            .with_external_type(ExternalType::Integer)
    }

    /// Feasible points are sorted.
    pub fn discrete(name: impl Into<String>, mut feasible_points: Vec<f64>) -> Self {
        feasible_points.sort_by(f64::total_cmp);
        Self::new(name, ParameterDomain::Discrete { feasible_points })
    }

    pub fn categorical<I, S>(name: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let categories = categories.into_iter().map(Into::into).collect();
        Self::new(name, ParameterDomain::Categorical { categories })
    }

    /// A categorical `"True"`/`"False"` parameter exposed as a boolean.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::categorical(name, ["False", "True"]).with_external_type(ExternalType::Boolean)
    }

    /// Rename to the multi-dimensional element `name[index]`.
    pub fn with_index(mut self, index: usize) -> Self {
        self.name = crate::search_space::multi_dimensional_parameter_name(&self.name, index);
        self
    }

    pub fn with_scale_type(mut self, scale_type: ScaleType) -> Self {
        self.scale_type = Some(scale_type);
        self
    }

    pub fn with_default(mut self, value: impl Into<ParameterValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_external_type(mut self, external_type: ExternalType) -> Self {
        self.external_type = Some(external_type);
        self
    }

    pub fn parameter_type(&self) -> ParameterType {
        self.domain.parameter_type()
    }

    /// Whether this config is active when its parent took `parent_value`.
    pub fn is_active_under(&self, parent_value: &ParameterValue) -> bool {
        self.matching_parent_values
            .iter()
            .any(|v| v.matches(parent_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cast_strings_to_numbers() {
        let half = ParameterValue::from("0.5");
        assert_eq!(half.cast(ExternalType::Float), Some(ParameterValue::Float(0.5)));
        assert_eq!(half.cast(ExternalType::Integer), None);

        let three = ParameterValue::from("3");
        assert_eq!(three.cast(ExternalType::Integer), Some(ParameterValue::Int(3)));
        assert_eq!(three.cast(ExternalType::Float), Some(ParameterValue::Float(3.0)));
        assert_eq!(
            ParameterValue::from("3.0").cast(ExternalType::Integer),
            Some(ParameterValue::Int(3))
        );
        assert_eq!(ParameterValue::from("x").cast(ExternalType::Float), None);
    }

    #[test]
    fn cast_numbers() {
        assert_eq!(
            ParameterValue::Float(4.0).cast(ExternalType::Integer),
            Some(ParameterValue::Int(4))
        );
        assert_eq!(ParameterValue::Float(4.5).cast(ExternalType::Integer), None);
        assert_eq!(
            ParameterValue::Int(2).cast(ExternalType::Float),
            Some(ParameterValue::Float(2.0))
        );
        assert_eq!(ParameterValue::Bool(true).cast(ExternalType::Float), None);
    }

    #[test]
    fn cast_booleans() {
        assert_eq!(
            ParameterValue::from("True").cast(ExternalType::Boolean),
            Some(ParameterValue::Bool(true))
        );
        assert_eq!(
            ParameterValue::from("false").cast(ExternalType::Boolean),
            Some(ParameterValue::Bool(false))
        );
        assert_eq!(ParameterValue::from("yes").cast(ExternalType::Boolean), None);
        assert_eq!(ParameterValue::Int(1).cast(ExternalType::Boolean), None);
    }

    #[test]
    fn internal_cast_is_identity() {
        let v = ParameterValue::from("anything");
        assert_eq!(v.cast(ExternalType::Internal), Some(v.clone()));
    }

    #[test]
    fn numeric_matching_ignores_representation() {
        assert!(ParameterValue::Int(3).matches(&ParameterValue::Float(3.0)));
        assert!(!ParameterValue::Int(3).matches(&ParameterValue::from("3")));
        assert!(ParameterValue::from("low").matches(&ParameterValue::from("low")));
        assert!(!ParameterValue::Bool(true).matches(&ParameterValue::Int(1)));
    }

    #[test]
    fn domain_validation() {
        assert!(ParameterDomain::Double { min: 0.0, max: 1.0 }.validate().is_ok());
        assert!(ParameterDomain::Double { min: 2.0, max: 1.0 }.validate().is_err());
        assert!(ParameterDomain::Double { min: 0.0, max: f64::INFINITY }.validate().is_err());
        assert!(ParameterDomain::Integer { min: 5, max: 1 }.validate().is_err());
        assert!(ParameterDomain::Discrete { feasible_points: vec![] }.validate().is_err());
        assert!(
            ParameterDomain::Categorical { categories: vec!["a".into(), "a".into()] }
                .validate()
                .is_err()
        );
    }

    #[test]
    fn domain_membership() {
        let ints = ParameterDomain::Integer { min: 1, max: 5 };
        assert!(ints.contains(&ParameterValue::Int(3)));
        assert!(ints.contains(&ParameterValue::Float(3.0)));
        assert!(!ints.contains(&ParameterValue::Int(6)));
        assert!(!ints.contains(&ParameterValue::from("3")));

        let points = ParameterConfig::discrete("d", vec![3.0, 1.0, 2.0]);
        assert_eq!(
            points.domain,
            ParameterDomain::Discrete { feasible_points: vec![1.0, 2.0, 3.0] }
        );
        assert!(points.domain.contains(&ParameterValue::Int(2)));
        assert!(!points.domain.contains(&ParameterValue::Float(2.5)));

        let cats = ParameterConfig::categorical("c", ["a", "b"]);
        assert!(cats.domain.contains(&ParameterValue::from("a")));
        assert!(!cats.domain.contains(&ParameterValue::from("z")));
    }

    #[test]
    fn boolean_params_are_categorical() {
        let b = ParameterConfig::boolean("flag");
        assert_eq!(b.parameter_type(), ParameterType::Categorical);
        assert_eq!(b.external_type, Some(ExternalType::Boolean));
    }

    #[test]
    fn deserialize_from_toml_with_children() {
        let src = r#"
name = "model"
type = "categorical"
categories = ["linear", "dnn"]

[[children]]
name = "layers"
type = "integer"
min = 1
max = 4
parent_values = ["dnn"]
"#;
        let pc: ParameterConfig = toml::from_str(src).unwrap();
        assert_eq!(pc.parameter_type(), ParameterType::Categorical);
        assert_eq!(pc.children.len(), 1);
        let child = &pc.children[0];
        assert_eq!(child.domain, ParameterDomain::Integer { min: 1, max: 4 });
        assert!(child.is_active_under(&ParameterValue::from("dnn")));
        assert!(!child.is_active_under(&ParameterValue::from("linear")));
    }
}
