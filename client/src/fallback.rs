//! Deterministic canned verdicts for when the backend cannot answer.
//!
//! Selection is `text.len() % TEMPLATES.len()`: stable for a given input,
//! varied across inputs, and entirely offline. The templates are literal
//! data; `harmful`, `risk_level`, and `output` are hardcoded per template
//! rather than derived from one another.

use vigil_types::{AnalysisResult, OutputCategory, RiskLevel};

struct FallbackTemplate {
    post: &'static str,
    predicted_skills: &'static [&'static str],
    output: &'static [(&'static str, f64)],
    harmful: bool,
    risk_level: RiskLevel,
}

impl FallbackTemplate {
    fn to_result(&self) -> AnalysisResult {
        AnalysisResult {
            post: self.post.to_string(),
            predicted_skills: self
                .predicted_skills
                .iter()
                .map(ToString::to_string)
                .collect(),
            output: self
                .output
                .iter()
                .map(|&(label, confidence)| OutputCategory {
                    label: label.to_string(),
                    confidence,
                })
                .collect(),
            harmful: self.harmful,
            risk_level: self.risk_level,
            timestamp: String::new(),
        }
    }
}

const TEMPLATES: [FallbackTemplate; 2] = [
    FallbackTemplate {
        post: "This is a harmless status update about my weekend plans.",
        predicted_skills: &[],
        output: &[],
        harmful: false,
        risk_level: RiskLevel::Safe,
    },
    FallbackTemplate {
        post: "I will find you and make you pay.",
        predicted_skills: &["threat_detection"],
        output: &[("threat", 0.92)],
        harmful: true,
        risk_level: RiskLevel::High,
    },
];

/// Build an example verdict for `text` without talking to the backend.
///
/// Picks a canned template by input byte length, then overwrites the
/// template's `post` and `timestamp` with the caller's values.
#[must_use]
pub fn fallback_result(text: &str, timestamp: String) -> AnalysisResult {
    let mut result = TEMPLATES[text.len() % TEMPLATES.len()].to_result();
    result.post = text.to_string();
    result.timestamp = timestamp;
    result
}

#[cfg(test)]
mod tests {
    use vigil_types::RiskLevel;

    use super::fallback_result;

    fn stamp() -> String {
        "2026-08-21T10:00:00Z".to_string()
    }

    #[test]
    fn selection_is_deterministic_for_equal_lengths() {
        let a = fallback_result("abcd", stamp());
        let b = fallback_result("wxyz", stamp());
        assert_eq!(a.risk_level, b.risk_level);
        assert_eq!(a.harmful, b.harmful);
    }

    #[test]
    fn even_length_selects_the_benign_template() {
        let result = fallback_result("ab", stamp());
        assert_eq!(result.risk_level, RiskLevel::Safe);
        assert!(!result.harmful);
        assert!(result.output.is_empty());
        assert!(result.predicted_skills.is_empty());
    }

    #[test]
    fn odd_length_selects_the_threat_template() {
        let result = fallback_result("abc", stamp());
        assert_eq!(result.risk_level, RiskLevel::High);
        assert!(result.harmful);
        assert_eq!(result.output.len(), 1);
        assert_eq!(result.output[0].label, "threat");
        assert_eq!(result.predicted_skills, vec!["threat_detection"]);
    }

    #[test]
    fn post_and_timestamp_are_overwritten() {
        let result = fallback_result("my own words", "2030-01-01T00:00:00Z".to_string());
        assert_eq!(result.post, "my own words");
        assert_eq!(result.timestamp, "2030-01-01T00:00:00Z");
    }

    #[test]
    fn benign_scenario_weekend_plans() {
        let text = "This is a harmless status update about my weekend plans.";
        let result = fallback_result(text, stamp());
        assert_eq!(result.risk_level, RiskLevel::Safe);
        assert!(!result.harmful);
    }

    #[test]
    fn threat_scenario_make_you_pay() {
        let text = "I will find you and make you pay.";
        let result = fallback_result(text, stamp());
        assert_eq!(result.risk_level, RiskLevel::High);
        assert!(result.harmful);
        assert_eq!(result.output.len(), 1);
        assert_eq!(result.output[0].label, "threat");
    }

    #[test]
    fn harmful_templates_carry_output_categories() {
        // Template invariant: harmful and a non-empty output go together.
        let benign = fallback_result("ab", stamp());
        let threat = fallback_result("abc", stamp());
        assert_eq!(benign.harmful, !benign.output.is_empty());
        assert_eq!(threat.harmful, !threat.output.is_empty());
    }
}
