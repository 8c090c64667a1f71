use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::debug;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json)?\s*").expect("code fence pattern is valid")
});

/// Shape of a model reply after best-effort JSON extraction
#[derive(Debug, Clone, PartialEq)]
pub enum RawReply {
    /// A JSON object, either the whole reply or the outermost `{...}` span
    Object(Map<String, Value>),
    /// Valid JSON whose top level is an array
    Array(Vec<Value>),
    /// Valid JSON whose top level is a string, number, boolean or null
    Scalar(Value),
    /// Nothing in the text parsed as JSON
    Unparseable(String),
}

impl RawReply {
    pub fn kind(&self) -> &'static str {
        match self {
            RawReply::Object(_) => "object",
            RawReply::Array(_) => "array",
            RawReply::Scalar(_) => "scalar",
            RawReply::Unparseable(_) => "unparseable",
        }
    }
}

/// Remove markdown code fence markers wherever they occur
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").into_owned()
}

/// Extract a JSON object from free-form model text.
///
/// The whole (fence-stripped, trimmed) text is tried first. When that is
/// not an object, the span from the first `{` to the last `}` is tried.
/// If neither yields an object, the shape of the first attempt is reported.
pub fn extract_reply(text: &str) -> RawReply {
    let stripped = strip_code_fences(text);
    let trimmed = stripped.trim();

    let fallback = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => {
            debug!("Model reply parsed as a JSON object");
            return RawReply::Object(map);
        }
        Ok(Value::Array(items)) => RawReply::Array(items),
        Ok(scalar) => RawReply::Scalar(scalar),
        Err(_) => RawReply::Unparseable(trimmed.to_string()),
    };

    if let Some(map) = braced_object(trimmed) {
        debug!(
            "Extracted JSON object from {} model reply",
            fallback.kind()
        );
        return RawReply::Object(map);
    }

    fallback
}

/// Parse the greedy `{...}` span: first opening brace to last closing brace
fn braced_object(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
