//! tunegrid-study — search spaces, study configuration and trial resolution.
//!
//! A [`StudyConfig`] owns a [`SearchSpace`] of (possibly conditional)
//! parameters. Trials arrive with raw parameter values; the resolver walks
//! the parameter tree to decide which values are active, casts them to
//! their external types and regroups `name[i]` parameters into sequences.
//!
//! # Architecture
//!
//! - **`parameter`** — values, domains and [`ParameterConfig`]
//! - **`search_space`** — [`SearchSpace`] and its selector builder
//! - **`resolve`** — raw trial values to external values
//! - **`config`** — `study.toml` parsing and [`StudyConfig`]
//! - **`designer`** — seeded [`RandomDesigner`] for flat spaces

pub mod config;
pub mod designer;
pub mod error;
pub mod parameter;
pub mod resolve;
pub mod search_space;
pub mod trial;

pub use config::{
    Algorithm, AutomatedStoppingConfig, MetricInformation, ObjectiveMetricGoal, ObservationNoise,
    StudyConfig, StudyConfigDoc,
};
pub use designer::{RandomDesigner, TrialSuggestion};
pub use error::{StudyError, StudyResult};
pub use parameter::{
    ExternalType, ParameterConfig, ParameterDomain, ParameterType, ParameterValue, ScaleType,
};
pub use resolve::{resolve_parameters, resolve_trial, ResolvedValue};
pub use search_space::{
    multi_dimensional_parameter_name, parse_multi_dimensional_parameter_name, SearchSpace,
    SearchSpaceSelector,
};
pub use trial::{Measurement, Trial, TrialId, TrialStatus};
