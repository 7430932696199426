//! Invocation events and responses.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use advisor_core::{Alert, HistoricalAlert};

use crate::error::HandlerError;

/// The only action this handler serves.
pub const GENERATE_RECOMMENDATIONS: &str = "generateRecommendations";

/// Status-coded reply; `body` is a JSON document encoded as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    pub fn ok(body: &Value) -> Self {
        Self {
            status_code: 200,
            body: body.to_string(),
        }
    }

    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            body: json!({ "error": message.into() }).to_string(),
        }
    }

    /// The body decoded back into JSON.
    pub fn body_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

impl From<&HandlerError> for HandlerResponse {
    fn from(err: &HandlerError) -> Self {
        Self::error(err.status_code(), err.to_string())
    }
}

/// A validated `generateRecommendations` request.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub current_alert: Alert,
    pub historical_alerts: Vec<HistoricalAlert>,
}

impl RecommendationRequest {
    /// Validate a raw event.
    ///
    /// The action is checked before the context. A `currentAlert` that is
    /// missing or empty (`null`, `false`, `0`, `""`, `[]`, `{}`) counts as absent.
    pub fn from_event(event: &Value) -> Result<Self, HandlerError> {
        let action = event.get("action").unwrap_or(&Value::Null);
        if action.as_str() != Some(GENERATE_RECOMMENDATIONS) {
            let shown = match action {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(HandlerError::UnsupportedAction(shown));
        }

        let context = match event.get("context") {
            None | Some(Value::Null) => return Err(HandlerError::MissingCurrentAlert),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(HandlerError::invalid_request(format!(
                    "context must be an object, got {}",
                    json_type(other)
                )))
            }
        };

        let current_alert = match context.get("currentAlert") {
            Some(value) if !is_empty(value) => Alert::deserialize(value)
                .map_err(|e| HandlerError::invalid_request(format!("currentAlert: {}", e)))?,
            _ => return Err(HandlerError::MissingCurrentAlert),
        };

        let historical_alerts = match context.get("historicalAlerts") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => Vec::<HistoricalAlert>::deserialize(value)
                .map_err(|e| HandlerError::invalid_request(format!("historicalAlerts: {}", e)))?,
        };

        Ok(Self {
            current_alert,
            historical_alerts,
        })
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The local test event: a Miami hurricane with one prior hurricane on record.
pub fn sample_event() -> Value {
    json!({
        "action": GENERATE_RECOMMENDATIONS,
        "context": {
            "currentAlert": {
                "eventType": "weather",
                "subType": "hurricane",
                "severity": 8,
                "headline": "Hurricane Warning for Coastal Areas",
                "description": "Category 3 hurricane approaching with expected landfall in 24 hours.",
                "location": {"lat": 25.7617, "lng": -80.1918},
                "affectedAreas": [
                    {"areaId": "area-123", "areaName": "Miami-Dade County", "areaType": "county"}
                ]
            },
            "historicalAlerts": [
                {
                    "eventType": "weather",
                    "subType": "hurricane",
                    "severity": 7,
                    "headline": "Hurricane Warning",
                    "startTime": "2024-05-15T10:00:00Z",
                    "effectiveActions": [
                        "Early evacuation of coastal areas",
                        "Securing critical infrastructure",
                        "Establishing emergency shelters"
                    ],
                    "outcomes": ["Minimal casualties", "Significant property damage"]
                }
            ]
        }
    })
}
