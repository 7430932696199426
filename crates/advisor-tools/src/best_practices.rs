//! Curated best practices per emergency type.

use async_trait::async_trait;
use serde::Deserialize;

use advisor_core::{Error, PropertySchema, Tool, ToolDefinition, ToolOutput, ToolParameters};

const DEFAULT_KEY: &str = "default";

type SubTypeTable = &'static [(&'static str, &'static [&'static str])];

static BEST_PRACTICES: &[(&str, SubTypeTable)] = &[
    (
        "weather",
        &[
            (
                "hurricane",
                &[
                    "Evacuate if directed by local authorities",
                    "Secure outdoor objects that could become projectiles",
                    "Prepare emergency supplies including food, water, and medications",
                    "Stay away from windows during the storm",
                    "Monitor NOAA Weather Radio for updates",
                ],
            ),
            (
                "tornado",
                &[
                    "Move to an interior room on the lowest floor",
                    "Stay away from windows",
                    "Cover your head and neck",
                    "Monitor local weather alerts",
                    "Have emergency supplies ready",
                ],
            ),
            (
                "flood",
                &[
                    "Move to higher ground immediately",
                    "Do not walk, swim, or drive through flood waters",
                    "Stay off bridges over fast-moving water",
                    "Evacuate if told to do so",
                    "Prepare emergency supplies",
                ],
            ),
            (
                DEFAULT_KEY,
                &[
                    "Stay informed through official weather channels",
                    "Prepare emergency supplies",
                    "Follow evacuation orders if issued",
                    "Secure your property if time allows",
                    "Have a communication plan with family members",
                ],
            ),
        ],
    ),
    (
        "earthquake",
        &[(
            DEFAULT_KEY,
            &[
                "Drop, cover, and hold on",
                "If indoors, stay away from windows and exterior walls",
                "If outdoors, move to an open area away from buildings and power lines",
                "Be prepared for aftershocks",
                "Check for injuries and damage after shaking stops",
                "Listen to emergency radio for instructions",
            ],
        )],
    ),
    (
        "health",
        &[
            (
                "epidemic",
                &[
                    "Follow public health guidelines",
                    "Practice good hygiene including frequent handwashing",
                    "Maintain social distancing as recommended",
                    "Wear appropriate protective equipment if advised",
                    "Stay home if you develop symptoms",
                    "Seek medical attention if symptoms worsen",
                ],
            ),
            (
                DEFAULT_KEY,
                &[
                    "Follow guidance from health authorities",
                    "Maintain proper hygiene practices",
                    "Stay informed through official health channels",
                    "Prepare necessary medications and supplies",
                    "Have emergency contacts readily available",
                ],
            ),
        ],
    ),
    (
        "security",
        &[(
            DEFAULT_KEY,
            &[
                "Follow instructions from authorities",
                "Avoid the affected area",
                "Report suspicious activity to authorities",
                "Stay informed through official channels",
                "Have an emergency plan and supplies ready",
            ],
        )],
    ),
];

static GLOBAL_DEFAULT: &[&str] = &[
    "Stay informed through official channels",
    "Follow instructions from authorities",
    "Have emergency supplies ready",
    "Develop and practice an emergency plan",
    "Help neighbors who may need assistance",
];

fn find<'a, T>(entries: &'a [(&'static str, T)], key: &str) -> Option<&'a T> {
    entries
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

/// Recommended actions for an event type and optional sub-type.
///
/// Falls back to the event type's default list, then to the global list, so
/// the result is never empty. Matching ignores case.
pub fn best_practices(event_type: &str, sub_type: Option<&str>) -> &'static [&'static str] {
    let Some(&sub_types) = find(BEST_PRACTICES, event_type) else {
        return GLOBAL_DEFAULT;
    };

    sub_type
        .and_then(|s| find(sub_types, s))
        .or_else(|| find(sub_types, DEFAULT_KEY))
        .copied()
        .unwrap_or(GLOBAL_DEFAULT)
}

pub struct BestPracticesTool;

impl BestPracticesTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BestPracticesTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct BestPracticesArgs {
    event_type: String,
    #[serde(default)]
    sub_type: Option<String>,
}

#[async_trait]
impl Tool for BestPracticesTool {
    fn name(&self) -> &str {
        "get_best_practices"
    }

    fn description(&self) -> &str {
        "Get established best practices for a type of emergency, e.g. event_type 'weather' with sub_type 'hurricane'."
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description()).with_parameters(
            ToolParameters::new()
                .add_property(
                    "event_type",
                    PropertySchema::string("Event type: weather, earthquake, health, security"),
                    true,
                )
                .add_property(
                    "sub_type",
                    PropertySchema::string("Optional sub-type, e.g. hurricane, tornado, flood, epidemic"),
                    false,
                ),
        )
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, Error> {
        let args: BestPracticesArgs = serde_json::from_value(arguments)
            .map_err(|e| Error::tool(self.name(), format!("Invalid arguments: {}", e)))?;

        ToolOutput::json(&best_practices(&args.event_type, args.sub_type.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hurricane() {
        let practices = best_practices("weather", Some("hurricane"));
        assert_eq!(practices.len(), 5);
        assert_eq!(practices[0], "Evacuate if directed by local authorities");
        assert_eq!(practices[4], "Monitor NOAA Weather Radio for updates");
    }

    #[test]
    fn test_unknown_sub_type_uses_type_default() {
        let practices = best_practices("weather", Some("blizzard"));
        assert_eq!(practices[0], "Stay informed through official weather channels");
        assert_eq!(best_practices("weather", None), practices);
    }

    #[test]
    fn test_unknown_type_uses_global_default() {
        let practices = best_practices("volcano", Some("eruption"));
        assert_eq!(practices, GLOBAL_DEFAULT);
        assert_eq!(practices[4], "Help neighbors who may need assistance");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            best_practices("WEATHER", Some("Hurricane")),
            best_practices("weather", Some("hurricane"))
        );
        assert_eq!(best_practices("Health", Some("EPIDEMIC")).len(), 6);
    }

    #[test]
    fn test_table_sizes() {
        assert_eq!(best_practices("weather", Some("tornado")).len(), 5);
        assert_eq!(best_practices("weather", Some("flood")).len(), 5);
        assert_eq!(best_practices("earthquake", None).len(), 6);
        assert_eq!(best_practices("health", None).len(), 5);
        assert_eq!(best_practices("security", Some("bomb threat")).len(), 5);
    }

    #[test]
    fn test_never_empty() {
        for (event_type, sub_types) in BEST_PRACTICES {
            for (sub_type, _) in *sub_types {
                assert!(!best_practices(event_type, Some(*sub_type)).is_empty());
            }
        }
        assert!(!best_practices("", None).is_empty());
    }

    #[tokio::test]
    async fn test_tool_returns_json_array() {
        let tool = BestPracticesTool::new();
        let output = tool
            .execute(json!({"event_type": "earthquake"}))
            .await
            .unwrap();
        let practices: Vec<String> = serde_json::from_str(&output.content).unwrap();
        assert_eq!(practices[0], "Drop, cover, and hold on");
    }

    #[tokio::test]
    async fn test_tool_requires_event_type() {
        let tool = BestPracticesTool::new();
        assert!(tool.execute(json!({"sub_type": "flood"})).await.is_err());
    }
}
