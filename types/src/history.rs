//! Persisted history records derived from completed analyses.

use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisResult, RiskLevel};

/// A compact record of one completed analysis.
///
/// Unknown fields are ignored on load so newer writers stay readable; a
/// missing required field or wrong type is a shape error, which the store
/// treats as corruption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub risk_level: RiskLevel,
    pub harmful: bool,
    /// Copy of the analyzed text.
    pub text: String,
}

impl HistoryEntry {
    /// The only derivation path from a verdict to its history record.
    #[must_use]
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            timestamp: result.timestamp.clone(),
            risk_level: result.risk_level,
            harmful: result.harmful,
            text: result.post.clone(),
        }
    }
}
