use thiserror::Error;

use crate::llm::LlmError;

/// Failure taxonomy for itinerary generation.
///
/// Input errors abort before any network call; model errors abort the whole
/// orchestration. Geometry-enrichment failures never appear here: they are
/// swallowed per day into an empty polyline.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("missing or invalid parameter: {0}")]
    MissingInput(&'static str),
    #[error("no response from language model: {0}")]
    Model(#[from] LlmError),
    #[error("failed to decode model output as an itinerary")]
    MalformedModelOutput { raw: String },
}
