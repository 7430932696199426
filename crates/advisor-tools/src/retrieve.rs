//! Knowledge base retrieval over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use advisor_core::{Error, PropertySchema, Tool, ToolDefinition, ToolOutput, ToolParameters};

pub const DEFAULT_NUMBER_OF_RESULTS: usize = 10;
pub const DEFAULT_MIN_SCORE: f64 = 0.4;

/// Where and how to query the knowledge base.
#[derive(Clone, Debug)]
pub struct KnowledgeBaseConfig {
    /// Full URL of the retrieval endpoint (e.g., "http://localhost:8080/retrieve")
    pub endpoint: String,
    pub number_of_results: usize,
    pub min_score: f64,
}

impl KnowledgeBaseConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            number_of_results: DEFAULT_NUMBER_OF_RESULTS,
            min_score: DEFAULT_MIN_SCORE,
        }
    }

    pub fn with_number_of_results(mut self, n: usize) -> Self {
        self.number_of_results = n;
        self
    }

    pub fn with_min_score(mut self, score: f64) -> Self {
        self.min_score = score;
        self
    }
}

pub struct RetrieveTool {
    client: Client,
    config: Option<KnowledgeBaseConfig>,
}

impl RetrieveTool {
    /// Without a config the tool stays registered but reports the knowledge
    /// base as unavailable.
    pub fn new(config: Option<KnowledgeBaseConfig>) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("alert-advisor/", env!("CARGO_PKG_VERSION")))
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            config,
        }
    }
}

#[derive(Serialize)]
struct RetrieveRequest<'a> {
    query: &'a str,
    #[serde(rename = "numberOfResults")]
    number_of_results: usize,
}

#[derive(Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    results: Vec<RetrievedPassage>,
}

#[derive(Deserialize)]
struct RetrievedPassage {
    content: String,
    score: f64,
    #[serde(default)]
    source: Option<String>,
}

#[derive(Deserialize)]
struct RetrieveArgs {
    text: String,
    #[serde(default, rename = "numberOfResults")]
    number_of_results: Option<usize>,
    #[serde(default)]
    score: Option<f64>,
}

fn format_passages(passages: &[RetrievedPassage], min_score: f64) -> String {
    let kept: Vec<_> = passages.iter().filter(|p| p.score >= min_score).collect();
    if kept.is_empty() {
        return format!("No results found above score threshold {}.", min_score);
    }

    let mut output = format!("Retrieved {} results:\n", kept.len());
    for passage in kept {
        output.push_str(&format!("\nScore: {:.4}\n", passage.score));
        if let Some(source) = &passage.source {
            output.push_str(&format!("Source: {}\n", source));
        }
        output.push_str(&format!("Content: {}\n", passage.content));
    }
    output
}

#[async_trait]
impl Tool for RetrieveTool {
    fn name(&self) -> &str {
        "retrieve"
    }

    fn description(&self) -> &str {
        "Retrieve relevant passages from the emergency management knowledge base using semantic search."
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description()).with_parameters(
            ToolParameters::new()
                .add_property("text", PropertySchema::string("The query to retrieve passages for"), true)
                .add_property(
                    "numberOfResults",
                    PropertySchema::integer("Maximum number of results to return")
                        .with_default(serde_json::json!(DEFAULT_NUMBER_OF_RESULTS)),
                    false,
                )
                .add_property(
                    "score",
                    PropertySchema::number("Minimum relevance score between 0 and 1")
                        .with_default(serde_json::json!(DEFAULT_MIN_SCORE)),
                    false,
                ),
        )
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, Error> {
        let args: RetrieveArgs = serde_json::from_value(arguments)
            .map_err(|e| Error::tool("retrieve", format!("Invalid arguments: {}", e)))?;

        let Some(config) = &self.config else {
            return Ok(ToolOutput::error(
                "Knowledge base is not configured; continue using the other tools.",
            ));
        };

        let request = RetrieveRequest {
            query: &args.text,
            number_of_results: args.number_of_results.unwrap_or(config.number_of_results),
        };
        let min_score = args.score.unwrap_or(config.min_score);

        tracing::debug!(
            endpoint = %config.endpoint,
            number_of_results = request.number_of_results,
            min_score,
            "Querying knowledge base"
        );

        let response = self
            .client
            .post(&config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::tool("retrieve", format!("Retrieve request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::tool(
                "retrieve",
                format!("Knowledge base error {}: {}", status, body),
            ));
        }

        let result: RetrieveResponse = response.json().await.map_err(|e| {
            Error::tool("retrieve", format!("Failed to parse retrieve response: {}", e))
        })?;

        Ok(ToolOutput::success(format_passages(&result.results, min_score)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn passage(content: &str, score: f64, source: Option<&str>) -> RetrievedPassage {
        RetrievedPassage {
            content: content.to_string(),
            score,
            source: source.map(String::from),
        }
    }

    #[test]
    fn test_format_filters_by_score() {
        let passages = vec![
            passage("Evacuation routes for Miami-Dade", 0.82, Some("fema-guide.pdf")),
            passage("Unrelated", 0.1, None),
        ];
        let output = format_passages(&passages, 0.4);
        assert!(output.starts_with("Retrieved 1 results"));
        assert!(output.contains("Source: fema-guide.pdf"));
        assert!(!output.contains("Unrelated"));
    }

    #[test]
    fn test_format_nothing_above_threshold() {
        let output = format_passages(&[passage("low", 0.2, None)], 0.4);
        assert_eq!(output, "No results found above score threshold 0.4.");
    }

    #[tokio::test]
    async fn test_unconfigured_reports_unavailable() {
        let tool = RetrieveTool::new(None);
        let output = tool.execute(json!({"text": "hurricane shelters"})).await.unwrap();
        assert!(output.is_error);
        assert!(output.content.contains("not configured"));
    }

    #[tokio::test]
    async fn test_queries_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/retrieve"))
            .and(body_json(json!({"query": "hurricane shelters", "numberOfResults": 3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"content": "Shelters open 48h before landfall", "score": 0.9, "source": "county-plan"},
                    {"content": "Noise", "score": 0.3}
                ]
            })))
            .mount(&server)
            .await;

        let config = KnowledgeBaseConfig::new(format!("{}/retrieve", server.uri()));
        let tool = RetrieveTool::new(Some(config));
        let output = tool
            .execute(json!({"text": "hurricane shelters", "numberOfResults": 3}))
            .await
            .unwrap();

        assert!(!output.is_error);
        assert!(output.content.contains("Shelters open 48h before landfall"));
        assert!(output.content.contains("Source: county-plan"));
        assert!(!output.content.contains("Noise"));
    }

    #[tokio::test]
    async fn test_endpoint_failure_is_tool_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let tool = RetrieveTool::new(Some(KnowledgeBaseConfig::new(server.uri())));
        let err = tool.execute(json!({"text": "flood"})).await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
