//! User prompt rendering for a single alert.

use advisor_core::Alert;

/// Instructions given to the recommendation agent on every run.
pub const SYSTEM_PROMPT: &str = "You are an expert emergency management and public safety recommendation system.
Your role is to analyze alert data and generate actionable recommendations based on:
1. The current alert details
2. Historical patterns from similar alerts
3. Best practices for the specific type of emergency

Your recommendations should be:
- Clear and actionable
- Prioritized by importance
- Specific to the situation
- Based on evidence and best practices

For each recommendation, provide:
- The recommended action
- Why it's important
- How urgently it should be implemented

Always cite your sources and provide a confidence score for your recommendations.";

const RESPONSE_FORMAT: &str = r#"Format your response as a JSON object with the following structure:
{
    "recommendations": {
        "general": ["List of general recommendations"],
        "specific": ["List of specific actions tailored to this alert"]
    },
    "priorityLevel": "high|medium|low",
    "timeframe": "immediate|short-term|long-term",
    "confidenceScore": 0.0-1.0,
    "sources": ["List of sources or justifications"]
}"#;

/// Render the user prompt for `alert`.
///
/// `history_len` is the number of historical alerts bound to the pattern
/// analysis tool for this request.
pub fn build_prompt(alert: &Alert, history_len: usize) -> String {
    let severity = alert
        .severity
        .map(|s| s.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let location = alert
        .location
        .as_ref()
        .map(|l| l.to_string())
        .unwrap_or_else(|| "{}".to_string());
    let affected_areas =
        serde_json::to_string(&alert.affected_areas).unwrap_or_else(|_| "[]".to_string());

    let mut prompt = String::from("Generate recommendations for the following alert:\n\n");
    prompt.push_str("ALERT DETAILS:\n");
    prompt.push_str(&format!("Type: {}\n", alert.event_type.as_deref().unwrap_or("Unknown")));
    prompt.push_str(&format!("Sub-type: {}\n", alert.sub_type.as_deref().unwrap_or("N/A")));
    prompt.push_str(&format!("Severity: {}\n", severity));
    prompt.push_str(&format!("Headline: {}\n", alert.headline.as_deref().unwrap_or("N/A")));
    prompt.push_str(&format!(
        "Description: {}\n",
        alert.description.as_deref().unwrap_or("N/A")
    ));
    prompt.push_str(&format!("Location: {}\n", location));
    prompt.push_str(&format!("Affected Areas: {}\n\n", affected_areas));

    if history_len > 0 {
        prompt.push_str("HISTORICAL DATA:\n");
        prompt.push_str(&format!(
            "{} historical alert(s) are available. Call analyze_historical_patterns without arguments to analyze them.\n\n",
            history_len
        ));
    }

    prompt.push_str("Based on the alert details, historical data, and best practices:\n");
    prompt.push_str("1. Analyze historical patterns from similar alerts\n");
    prompt.push_str("2. Identify best practices for this type of event\n");
    prompt.push_str("3. Generate specific recommendations for this situation\n\n");
    prompt.push_str(RESPONSE_FORMAT);
    prompt.push('\n');
    prompt
}
