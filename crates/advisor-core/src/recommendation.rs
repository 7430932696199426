use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Timeframe {
    Immediate,
    ShortTerm,
    LongTerm,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub general: Vec<String>,
    pub specific: Vec<String>,
}

/// The structured answer returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub recommendations: RecommendationSet,
    pub priority_level: PriorityLevel,
    pub timeframe: Timeframe,
    /// In `[0, 1]`.
    pub confidence_score: f64,
    pub sources: Vec<String>,
}

impl Recommendation {
    /// Returned when the model's reply carries no usable JSON object.
    pub fn fallback() -> Self {
        Self {
            recommendations: RecommendationSet {
                general: vec![
                    "Stay informed through official channels".to_string(),
                    "Follow instructions from authorities".to_string(),
                ],
                specific: Vec::new(),
            },
            priority_level: PriorityLevel::Medium,
            timeframe: Timeframe::Immediate,
            confidence_score: 0.5,
            sources: vec!["System generated recommendations".to_string()],
        }
    }

    /// Checks a parsed value against the documented shape, reporting the first
    /// mismatch. Used for diagnostics only.
    pub fn check_shape(value: &serde_json::Value) -> Result<Self, String> {
        let parsed: Self = serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
        if !(0.0..=1.0).contains(&parsed.confidence_score) {
            return Err(format!(
                "confidenceScore {} outside [0, 1]",
                parsed.confidence_score
            ));
        }
        Ok(parsed)
    }
}
