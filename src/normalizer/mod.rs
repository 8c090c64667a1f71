//! Turns free-form model replies into a [`DiagnosisResult`].
//!
//! The model is asked for JSON but may wrap it in code fences, prefix it with
//! prose, drift field types, or return nothing usable at all. `normalize`
//! absorbs all of that and always produces a fully-populated record.

mod coerce;
mod extract;

pub use extract::{extract_reply, strip_code_fences, RawReply};

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::diagnosis::DiagnosisResult;

pub const PARSE_FAILURE_SUMMARY: &str = "Could not parse AI response. Please try again.";

/// Fields substituted when no JSON object can be recovered from a reply
pub fn parse_failure_payload() -> Map<String, Value> {
    let payload = json!({
        "is_healthy": false,
        "plant_name": "Unknown",
        "status": "unknown",
        "summary": PARSE_FAILURE_SUMMARY,
        "confidence": "Low",
        "problems": ["Analysis failed"],
        "reasons": ["The AI response was not in the expected format"],
        "solutions": ["Please re-upload the image and try again"],
        "additional_tips": ""
    });

    match payload {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Normalize raw model text. Never fails.
pub fn normalize(raw_text: &str) -> DiagnosisResult {
    normalize_reply(extract_reply(raw_text))
}

/// Normalize an already-extracted reply
pub fn normalize_reply(reply: RawReply) -> DiagnosisResult {
    match reply {
        RawReply::Object(fields) => {
            debug!("Coercing {} reply fields", fields.len());
            coerce::coerce_fields(&fields)
        }
        RawReply::Array(_) | RawReply::Scalar(_) | RawReply::Unparseable(_) => {
            warn!(
                "Model reply was {} rather than a JSON object, using parse-failure result",
                reply.kind()
            );
            coerce::coerce_fields(&parse_failure_payload())
        }
    }
}
