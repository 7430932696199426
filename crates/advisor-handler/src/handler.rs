//! Event handling on top of an [`AgentInvoker`].

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use advisor_core::{AgentConfig, AgentInvoker, Error, ProviderAgent};
use advisor_providers::AnthropicProvider;
use advisor_tools::{advisor_registry, KnowledgeBaseConfig};

use crate::config::Config;
use crate::error::HandlerError;
use crate::event::{HandlerResponse, RecommendationRequest};
use crate::extract::extract_recommendation;
use crate::prompt::{build_prompt, SYSTEM_PROMPT};

const AGENT_NAME: &str = "recommendation_agent";

/// Turns invocation events into recommendation responses.
///
/// Holds no per-request state; each call builds its own tool registry.
pub struct Handler {
    agent: Arc<dyn AgentInvoker>,
    knowledge_base: Option<KnowledgeBaseConfig>,
}

impl Handler {
    pub fn new(agent: Arc<dyn AgentInvoker>) -> Self {
        Self {
            agent,
            knowledge_base: None,
        }
    }

    pub fn with_knowledge_base(mut self, knowledge_base: Option<KnowledgeBaseConfig>) -> Self {
        self.knowledge_base = knowledge_base;
        self
    }

    /// Production wiring: Anthropic provider, tool loop and configured limits.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            Error::config("No API key configured. Set ADVISOR_API_KEY or ANTHROPIC_API_KEY")
        })?;

        let mut provider = AnthropicProvider::with_timeout(api_key, config.request_timeout())
            .with_default_model(&config.model_id);
        if let Some(base_url) = &config.base_url {
            provider = provider.with_base_url(base_url);
        }

        let mut agent_config = AgentConfig::new(AGENT_NAME)
            .with_system_prompt(SYSTEM_PROMPT)
            .with_model(&config.model_id)
            .with_max_tokens(config.max_tokens)
            .with_max_iterations(config.max_iterations);
        if let Some(temperature) = config.temperature {
            agent_config = agent_config.with_temperature(temperature);
        }

        let agent = ProviderAgent::new(Arc::new(provider), agent_config);
        Ok(Self::new(Arc::new(agent))
            .with_knowledge_base(config.knowledge_base.to_tool_config()))
    }

    /// Handle one event. Never fails: errors become 400 or 500 responses.
    pub async fn handle(&self, event: &Value) -> HandlerResponse {
        info!(event = %event, "Received event");

        match self.recommend(event).await {
            Ok(recommendation) => HandlerResponse::ok(&recommendation),
            Err(e) => {
                if e.status_code() >= 500 {
                    let upstream = matches!(&e, HandlerError::Agent(inner) if inner.is_upstream());
                    error!(error = ?e, upstream, "Error generating recommendations");
                } else {
                    warn!(error = %e, "Rejected request");
                }
                HandlerResponse::from(&e)
            }
        }
    }

    /// Validate, prompt the agent and extract its recommendation.
    pub async fn recommend(&self, event: &Value) -> Result<Value, HandlerError> {
        let request = RecommendationRequest::from_event(event)?;

        let prompt = build_prompt(&request.current_alert, request.historical_alerts.len());
        let tools = Arc::new(advisor_registry(
            request.historical_alerts,
            self.knowledge_base.clone(),
        ));

        debug!(
            event_type = request.current_alert.event_type_or_unknown(),
            tools = ?tools.names(),
            prompt_len = prompt.len(),
            "Invoking agent"
        );

        let reply = self.agent.invoke(&prompt, tools).await?;
        let extraction = extract_recommendation(&reply);

        debug!(used_fallback = extraction.used_fallback, "Recommendation extracted");

        Ok(extraction.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::testing::{MockProvider, ScriptedAgent};
    use advisor_core::{Recommendation, Role, ToolCall};
    use serde_json::json;

    use crate::event::sample_event;

    const REPLY: &str = r#"Based on the analysis:
{
  "recommendations": {
    "general": ["Evacuate if directed by local authorities"],
    "specific": ["Open shelters in Miami-Dade County"]
  },
  "priorityLevel": "high",
  "timeframe": "immediate",
  "confidenceScore": 0.85,
  "sources": ["get_best_practices", "Historical hurricane response"]
}"#;

    fn handler_with(agent: Arc<dyn AgentInvoker>) -> Handler {
        Handler::new(agent)
    }

    #[tokio::test]
    async fn test_unsupported_action() {
        let agent = Arc::new(ScriptedAgent::new());
        let handler = handler_with(agent.clone());

        let response = handler.handle(&json!({"action": "foo"})).await;
        assert_eq!(response.status_code, 400);
        assert!(response.body_json().unwrap()["error"]
            .as_str()
            .unwrap()
            .contains("foo"));
        assert_eq!(agent.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_current_alert() {
        let handler = handler_with(Arc::new(ScriptedAgent::new()));
        let response = handler
            .handle(&json!({"action": "generateRecommendations", "context": {}}))
            .await;

        assert_eq!(response.status_code, 400);
        assert_eq!(
            response.body_json().unwrap(),
            json!({"error": "Current alert data is required"})
        );
    }

    #[tokio::test]
    async fn test_success_with_scripted_agent() {
        let agent = Arc::new(ScriptedAgent::replying(REPLY));
        let handler = handler_with(agent.clone());

        let response = handler.handle(&sample_event()).await;
        assert_eq!(response.status_code, 200);

        let body = response.body_json().unwrap();
        let recommendation = Recommendation::check_shape(&body).unwrap();
        assert_eq!(recommendation.confidence_score, 0.85);

        let prompt = agent.last_prompt().unwrap();
        assert!(prompt.contains("Type: weather"));
        assert!(prompt.contains("1 historical alert(s)"));
        assert_eq!(
            agent.offered_tools.lock().unwrap()[0],
            vec!["analyze_historical_patterns", "get_best_practices", "retrieve"]
        );
    }

    #[tokio::test]
    async fn test_unparseable_reply_uses_fallback() {
        let handler = handler_with(Arc::new(ScriptedAgent::replying("Sorry, no JSON today.")));
        let response = handler.handle(&sample_event()).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body_json().unwrap()["confidenceScore"], 0.5);
    }

    #[tokio::test]
    async fn test_agent_failure_is_500() {
        let handler = handler_with(Arc::new(ScriptedAgent::failing(Error::network(
            "connection refused",
        ))));
        let response = handler.handle(&sample_event()).await;

        assert_eq!(response.status_code, 500);
        let message = response.body_json().unwrap()["error"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(message.starts_with("Failed to generate recommendations:"));
        assert!(message.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_tool_loop_end_to_end() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_tool_calls(vec![
            ToolCall::new(
                "tc_1",
                "get_best_practices",
                json!({"event_type": "weather", "sub_type": "hurricane"}),
            ),
            ToolCall::new("tc_2", "analyze_historical_patterns", json!({})),
        ]);
        provider.queue_response(REPLY);

        let agent = ProviderAgent::new(
            provider.clone(),
            AgentConfig::new(AGENT_NAME).with_system_prompt(SYSTEM_PROMPT),
        );
        let handler = handler_with(Arc::new(agent));

        let response = handler.handle(&sample_event()).await;
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body_json().unwrap()["priorityLevel"], "high");
        assert_eq!(provider.request_count(), 2);

        let second = provider.last_request().unwrap();
        assert_eq!(second.messages[0].role, Role::System);
        let tool_results: Vec<_> = second
            .messages
            .iter()
            .filter(|m| m.role == Role::Tool)
            .collect();
        assert_eq!(tool_results.len(), 2);
        assert!(tool_results[0]
            .content
            .contains("Evacuate if directed by local authorities"));
        assert!(tool_results[1]
            .content
            .contains("Early evacuation of coastal areas"));
    }

    #[tokio::test]
    async fn test_provider_rate_limit_is_500() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_error(Error::RateLimit("Too many requests".to_string()));

        let agent = ProviderAgent::new(provider.clone(), AgentConfig::new(AGENT_NAME));
        let response = handler_with(Arc::new(agent)).handle(&sample_event()).await;

        assert_eq!(response.status_code, 500);
        assert!(response.body.contains("Too many requests"));
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_max_iterations_is_500() {
        let provider = Arc::new(MockProvider::new());
        for i in 0..2 {
            provider.queue_tool_calls(vec![ToolCall::new(
                format!("tc_{}", i),
                "get_best_practices",
                json!({"event_type": "weather"}),
            )]);
        }

        let agent = ProviderAgent::new(
            provider,
            AgentConfig::new(AGENT_NAME).with_max_iterations(2),
        );
        let response = handler_with(Arc::new(agent)).handle(&sample_event()).await;

        assert_eq!(response.status_code, 500);
        assert!(response.body.contains("exceeded max iterations"));
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = Config {
            api_key: None,
            ..Config::default()
        };
        assert!(matches!(Handler::from_config(&config), Err(Error::Config(_))));

        let config = Config {
            api_key: Some("sk-test".to_string()),
            ..Config::default()
        };
        assert!(Handler::from_config(&config).is_ok());
    }
}
