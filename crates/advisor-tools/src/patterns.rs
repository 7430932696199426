//! Historical pattern analysis.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use advisor_core::{
    EffectiveAction, Error, HistoricalAlert, PatternAnalysis, PatternSummary, PropertySchema, Tool,
    ToolDefinition, ToolOutput, ToolParameters,
};

/// Partitions below this size get no `PatternSummary`.
const MIN_PATTERN_SIZE: usize = 3;
const MAX_ACTIONS_PER_TYPE: usize = 3;
const MAX_CONFIDENCE: f64 = 0.95;

/// Summarise recurring behaviour and ranked effective actions per event type.
///
/// Event types are reported in the order they first appear in `alerts`, and
/// actions with equal counts keep their first-encounter order.
pub fn analyze_patterns(alerts: &[HistoricalAlert]) -> PatternAnalysis {
    let mut analysis = PatternAnalysis::default();

    for (event_type, group) in partition_by_event_type(alerts) {
        let size = group.len();

        let mut tallies: Vec<(&str, usize)> = Vec::new();
        for alert in &group {
            for action in &alert.effective_actions {
                match tallies.iter().position(|(a, _)| *a == action.as_str()) {
                    Some(i) => tallies[i].1 += 1,
                    None => tallies.push((action.as_str(), 1)),
                }
            }
        }
        // sort_by is stable, so ties stay in encounter order
        tallies.sort_by(|a, b| b.1.cmp(&a.1));

        for (action, count) in tallies.into_iter().take(MAX_ACTIONS_PER_TYPE) {
            analysis.effective_actions.push(EffectiveAction {
                action: action.to_string(),
                event_type: event_type.to_string(),
                frequency: count,
                confidence: (count as f64 / size as f64).min(MAX_CONFIDENCE),
            });
        }

        if size >= MIN_PATTERN_SIZE {
            let total: f64 = group.iter().map(|a| a.alert.severity.unwrap_or(0.0)).sum();
            analysis.patterns.push(PatternSummary {
                event_type: event_type.to_string(),
                count: size,
                average_severity: total / size as f64,
                description: format!(
                    "Pattern of {} alerts identified with {} occurrences",
                    event_type, size
                ),
            });
        }
    }

    analysis
}

fn partition_by_event_type(alerts: &[HistoricalAlert]) -> Vec<(&str, Vec<&HistoricalAlert>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&HistoricalAlert>)> = Vec::new();

    for alert in alerts {
        let event_type = alert.alert.event_type_or_unknown();
        match index.get(event_type) {
            Some(&i) => groups[i].1.push(alert),
            None => {
                index.insert(event_type, groups.len());
                groups.push((event_type, vec![alert]));
            }
        }
    }

    groups
}

/// Exposes [`analyze_patterns`] to the agent.
///
/// The tool is built per request and carries that request's historical
/// alerts, which are analysed when the model omits the `alerts` argument.
pub struct PatternAnalysisTool {
    history: Vec<HistoricalAlert>,
}

impl PatternAnalysisTool {
    pub fn new(history: Vec<HistoricalAlert>) -> Self {
        Self { history }
    }
}

#[derive(Deserialize)]
struct AnalyzePatternsArgs {
    #[serde(default)]
    alerts: Option<Vec<HistoricalAlert>>,
}

#[async_trait]
impl Tool for PatternAnalysisTool {
    fn name(&self) -> &str {
        "analyze_historical_patterns"
    }

    fn description(&self) -> &str {
        "Analyze historical alerts to identify recurring patterns and the actions that were most effective for each event type. Omit 'alerts' to analyze the historical alerts supplied with the current request."
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description()).with_parameters(
            ToolParameters::new().add_property(
                "alerts",
                PropertySchema::array(
                    "Historical alerts with eventType, severity, effectiveActions and outcomes",
                    PropertySchema::object("A historical alert"),
                ),
                false,
            ),
        )
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, Error> {
        let args: AnalyzePatternsArgs = serde_json::from_value(arguments)
            .map_err(|e| Error::tool(self.name(), format!("Invalid arguments: {}", e)))?;

        let analysis = match &args.alerts {
            Some(alerts) => analyze_patterns(alerts),
            None => analyze_patterns(&self.history),
        };

        tracing::debug!(
            patterns = analysis.patterns.len(),
            effective_actions = analysis.effective_actions.len(),
            "Analyzed historical patterns"
        );

        ToolOutput::json(&analysis)
    }
}
