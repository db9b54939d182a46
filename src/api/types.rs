//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::sim::kpi::EpisodeReport;
use crate::sim::params::ParameterSet;
use crate::sim::types::StepResult;

/// Combined state response: parameters, report, and the last step.
#[derive(Debug, Serialize)]
pub struct StateResponse<'a> {
    pub params: &'a ParameterSet,
    pub report: &'a EpisodeReport,
    /// `null` when the episode recorded no steps.
    pub latest_step: Option<&'a StepResult>,
}

/// Optional range query parameters for the steps endpoint.
#[derive(Debug, Deserialize)]
pub struct StepsQuery {
    /// Start timestep (inclusive).
    pub from: Option<usize>,
    /// End timestep (inclusive).
    pub to: Option<usize>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
