//! Alert records as they arrive on the wire.
//!
//! Every field is optional on input: callers send partial alerts and the
//! consumers (prompt builder, pattern aggregator) apply their own defaults.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Event type used when an alert does not carry one.
pub const UNKNOWN_EVENT_TYPE: &str = "unknown";

/// Reads an explicit `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single emergency notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Alert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Echoed into the prompt as-is; callers send `{lat, lng}` in any shape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    /// `{areaId, areaName, areaType}` records, echoed as-is
    #[serde(
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub affected_areas: Vec<Value>,
}

impl Alert {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: Some(event_type.into()),
            ..Self::default()
        }
    }

    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.sub_type = Some(sub_type.into());
        self
    }

    pub fn with_severity(mut self, severity: f64) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_headline(mut self, headline: impl Into<String>) -> Self {
        self.headline = Some(headline.into());
        self
    }

    /// The event type, or `"unknown"` when absent.
    pub fn event_type_or_unknown(&self) -> &str {
        self.event_type.as_deref().unwrap_or(UNKNOWN_EVENT_TYPE)
    }
}

/// A past alert together with what worked when it happened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalAlert {
    #[serde(flatten)]
    pub alert: Alert,
    #[serde(default, deserialize_with = "null_as_default")]
    pub effective_actions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub outcomes: Vec<String>,
}

impl HistoricalAlert {
    pub fn new(alert: Alert) -> Self {
        Self {
            alert,
            ..Self::default()
        }
    }

    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.effective_actions = actions.into_iter().map(Into::into).collect();
        self
    }
}

/// Recurring behaviour observed for one event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSummary {
    pub event_type: String,
    pub count: usize,
    pub average_severity: f64,
    pub description: String,
}

/// An action that was repeatedly recorded as effective for an event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveAction {
    pub action: String,
    pub event_type: String,
    pub frequency: usize,
    /// `min(frequency / alerts_of_type, 0.95)`
    pub confidence: f64,
}

/// Output of the historical pattern aggregator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternAnalysis {
    pub patterns: Vec<PatternSummary>,
    pub effective_actions: Vec<EffectiveAction>,
}
