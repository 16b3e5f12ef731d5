use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::JobId;

/// Computed result of a completed job. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Analysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    #[validate(range(min = 0.0, message = "Technical score must not be negative"))]
    pub technical_score: f64,
    #[validate(range(min = 0.0, message = "Communication score must not be negative"))]
    pub communication_score: f64,
    /// Fraction in [0, 1]
    #[validate(range(
        min = 0.0,
        max = 1.0,
        message = "Sentiment score must be between 0 and 1"
    ))]
    pub sentiment_score: f64,
    pub word_count: u64,
    #[serde(default)]
    pub executive_summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_service_payload() {
        let analysis: Analysis = serde_json::from_value(json!({
            "sentiment_score": 0.72,
            "word_count": 5120,
            "technical_score": 8.5,
            "communication_score": 7.0,
            "executive_summary": "Strong systems knowledge."
        }))
        .unwrap();
        assert_eq!(analysis.word_count, 5120);
        assert!(analysis.validate().is_ok());
    }

    #[test]
    fn sentiment_outside_unit_interval_is_invalid() {
        let analysis = Analysis {
            id: None,
            job_id: None,
            technical_score: 1.0,
            communication_score: 1.0,
            sentiment_score: 1.5,
            word_count: 10,
            executive_summary: String::new(),
        };
        assert!(analysis.validate().is_err());
    }
}
