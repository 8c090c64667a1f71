use serde::{Deserialize, Serialize};

pub const DEFAULT_PLANT_NAME: &str = "Unknown Plant";
pub const DEFAULT_SUMMARY: &str = "No summary available.";
pub const DEFAULT_CONFIDENCE: &str = "Medium";

/// Overall verdict for the photographed plant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Diseased,
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Diseased => "diseased",
            HealthStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strictly-typed diagnosis handed back to the caller.
///
/// Every field is always populated; see `normalizer::normalize` for how
/// untrusted model output is coerced into this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub status: HealthStatus,
    pub plant_name: String,
    pub summary: String,
    pub is_healthy: bool,
    pub problems: Vec<String>,
    pub reasons: Vec<String>,
    pub solutions: Vec<String>,
    pub confidence: String,
    pub additional_tips: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_camel_case_keys() {
        let result = DiagnosisResult {
            status: HealthStatus::Diseased,
            plant_name: "Tomato".to_string(),
            summary: "Early blight on lower leaves.".to_string(),
            is_healthy: false,
            problems: vec!["Early blight".to_string()],
            reasons: vec![],
            solutions: vec![],
            confidence: "High".to_string(),
            additional_tips: String::new(),
        };

        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], "diseased");
        assert_eq!(json["plantName"], "Tomato");
        assert_eq!(json["isHealthy"], false);
        assert_eq!(json["additionalTips"], "");
        assert!(json["problems"].is_array());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(HealthStatus::Unknown.to_string(), "unknown");
        assert_eq!(HealthStatus::Healthy.as_str(), "healthy");
    }
}
