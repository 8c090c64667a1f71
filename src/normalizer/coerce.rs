use serde_json::{Map, Value};

use crate::diagnosis::{
    DiagnosisResult, HealthStatus, DEFAULT_CONFIDENCE, DEFAULT_PLANT_NAME, DEFAULT_SUMMARY,
};

/// Render any JSON value as plain text
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Coerce a field into a string: lists are space-joined, absent/null use the fallback
pub(crate) fn ensure_string(value: Option<&Value>, fallback: &str) -> String {
    match value {
        None | Some(Value::Null) => fallback.to_string(),
        Some(Value::Array(items)) => items.iter().map(stringify).collect::<Vec<_>>().join(" "),
        Some(other) => stringify(other),
    }
}

/// Like `ensure_string`, but blank text also falls back
fn ensure_text(value: Option<&Value>, fallback: &str) -> String {
    let text = ensure_string(value, fallback);
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

/// Coerce a field into a list: bare non-empty strings become one item, anything else is empty
pub(crate) fn ensure_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().map(stringify).collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// `is_healthy` decides the status unless the model explicitly said "unknown"
pub(crate) fn resolve_status(fields: &Map<String, Value>) -> (HealthStatus, bool) {
    let is_healthy = matches!(fields.get("is_healthy"), Some(Value::Bool(true)));

    let status = match fields.get("status") {
        Some(Value::String(s)) if s == "unknown" => HealthStatus::Unknown,
        _ if is_healthy => HealthStatus::Healthy,
        _ => HealthStatus::Diseased,
    };

    (status, is_healthy)
}

/// Build a result from whatever fields the object carries
pub(crate) fn coerce_fields(fields: &Map<String, Value>) -> DiagnosisResult {
    let (status, is_healthy) = resolve_status(fields);

    DiagnosisResult {
        status,
        plant_name: ensure_text(fields.get("plant_name"), DEFAULT_PLANT_NAME),
        summary: ensure_text(fields.get("summary"), DEFAULT_SUMMARY),
        is_healthy,
        problems: ensure_list(fields.get("problems")),
        reasons: ensure_list(fields.get("reasons")),
        solutions: ensure_list(fields.get("solutions")),
        confidence: ensure_text(fields.get("confidence"), DEFAULT_CONFIDENCE),
        additional_tips: ensure_string(fields.get("additional_tips"), ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ensure_string_joins_lists() {
        let value = json!(["Water less.", 2, true]);
        assert_eq!(ensure_string(Some(&value), ""), "Water less. 2 true");
    }

    #[test]
    fn test_ensure_string_fallbacks() {
        assert_eq!(ensure_string(None, "fallback"), "fallback");
        assert_eq!(ensure_string(Some(&Value::Null), "fallback"), "fallback");
        assert_eq!(ensure_string(Some(&json!(0.5)), "fallback"), "0.5");
        assert_eq!(ensure_string(Some(&json!({"a": 1})), ""), r#"{"a":1}"#);
    }

    #[test]
    fn test_ensure_list_shapes() {
        assert_eq!(ensure_list(Some(&json!("  "))), Vec::<String>::new());
        assert_eq!(ensure_list(Some(&json!(42))), Vec::<String>::new());
        assert_eq!(ensure_list(Some(&json!({"k": "v"}))), Vec::<String>::new());
        assert_eq!(
            ensure_list(Some(&json!(["a", null]))),
            vec!["a".to_string(), "null".to_string()]
        );
    }

    #[test]
    fn test_non_boolean_is_healthy_reads_as_false() {
        let fields = json!({"is_healthy": "true"});
        let (status, is_healthy) = resolve_status(fields.as_object().unwrap());

        assert!(!is_healthy);
        assert_eq!(status, HealthStatus::Diseased);
    }

    #[test]
    fn test_status_match_is_exact() {
        let fields = json!({"is_healthy": true, "status": "Unknown"});
        let (status, _) = resolve_status(fields.as_object().unwrap());

        assert_eq!(status, HealthStatus::Healthy);
    }
}
