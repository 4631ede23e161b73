//! Verdict types returned by the detection backend (or synthesized locally).

use serde::{Deserialize, Serialize};

/// Overall harm assessment for one analyzed text.
///
/// Ordinal: `Safe < Low < Medium < High`. Serialized as the uppercase wire
/// strings (`"SAFE"`, `"LOW"`, `"MEDIUM"`, `"HIGH"`); anything else is a
/// deserialization error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

/// One detected harmful-content class with its probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputCategory {
    pub label: String,
    /// Probability in `[0, 1]` by backend contract; not revalidated here.
    pub confidence: f64,
}

/// A complete verdict for one submitted text.
///
/// Produced either by the backend (parsed verbatim from the response body)
/// or by the local fallback generator. `predicted_skills`, `output`, and
/// `timestamp` default when absent so older or partial backend payloads
/// still parse; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The submitted text, echoed back.
    pub post: String,
    /// Labels naming which detection skills ran; may be empty.
    #[serde(default)]
    pub predicted_skills: Vec<String>,
    /// Detected categories with confidences; empty when nothing was found.
    #[serde(default)]
    pub output: Vec<OutputCategory>,
    pub harmful: bool,
    pub risk_level: RiskLevel,
    /// RFC 3339 timestamp assigned when the result was created. Opaque to
    /// consumers; rendered as-is.
    #[serde(default)]
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::{AnalysisResult, RiskLevel};

    #[test]
    fn risk_level_ordering_is_ordinal() {
        assert!(RiskLevel::Safe < RiskLevel::Low);
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }

    #[test]
    fn risk_level_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&RiskLevel::Safe).unwrap(),
            "\"SAFE\""
        );
        assert_eq!(
            serde_json::to_string(&RiskLevel::High).unwrap(),
            "\"HIGH\""
        );
    }

    #[test]
    fn risk_level_rejects_unknown_strings() {
        assert!(serde_json::from_str::<RiskLevel>("\"CRITICAL\"").is_err());
        assert!(serde_json::from_str::<RiskLevel>("\"safe\"").is_err());
    }

    #[test]
    fn result_parses_full_payload() {
        let body = r#"{
            "post": "check this",
            "predicted_skills": ["threat_detection"],
            "output": [{"label": "threat", "confidence": 0.92}],
            "harmful": true,
            "risk_level": "HIGH",
            "timestamp": "2026-08-21T10:00:00Z"
        }"#;
        let result: AnalysisResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.post, "check this");
        assert_eq!(result.predicted_skills, vec!["threat_detection"]);
        assert_eq!(result.output.len(), 1);
        assert_eq!(result.output[0].label, "threat");
        assert!(result.harmful);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn result_defaults_optional_fields() {
        let body = r#"{"post": "hi", "harmful": false, "risk_level": "SAFE"}"#;
        let result: AnalysisResult = serde_json::from_str(body).unwrap();
        assert!(result.predicted_skills.is_empty());
        assert!(result.output.is_empty());
        assert!(result.timestamp.is_empty());
    }

    #[test]
    fn result_ignores_unknown_fields() {
        let body = r#"{
            "post": "hi",
            "harmful": false,
            "risk_level": "LOW",
            "model_version": "v3",
            "latency_ms": 12
        }"#;
        let result: AnalysisResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn result_rejects_missing_required_fields() {
        let body = r#"{"post": "hi", "risk_level": "SAFE"}"#;
        assert!(serde_json::from_str::<AnalysisResult>(body).is_err());
    }
}
