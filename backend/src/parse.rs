//! Structural parse of the model's reply. The model is asked for bare JSON
//! but routinely wraps it in a markdown code fence, so fences are stripped
//! before parsing. Anything that still fails to parse is an explicit
//! malformed-output error carrying the raw text; output is never coerced.
//!
//! The numeric/geometric constraints stated in the prompt (distance ranges,
//! waypoint counts, loop closure) are advisory to the model and are not
//! re-validated here.

use shared::Itinerary;

use crate::error::PlanError;

pub fn parse_itinerary(raw: &str) -> Result<Itinerary, PlanError> {
    let clean = strip_code_fences(raw);
    serde_json::from_str(&clean).map_err(|err| {
        tracing::warn!("model output failed to parse: {err}");
        PlanError::MalformedModelOutput {
            raw: raw.to_string(),
        }
    })
}

fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}
