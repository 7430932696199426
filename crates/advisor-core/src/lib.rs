//! advisor-core: Core types and traits for alert-advisor
//!
//! This crate provides the alert data model, the provider and tool
//! abstractions, and the agentic tool loop shared by the other crates.

pub mod agent;
pub mod alert;
pub mod error;
pub mod message;
pub mod provider;
pub mod recommendation;
pub mod tool;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use agent::{run_once, AgentConfig, AgentInvoker, AgentRun, ProviderAgent};
pub use alert::{
    Alert, EffectiveAction, HistoricalAlert, PatternAnalysis, PatternSummary, UNKNOWN_EVENT_TYPE,
};
pub use error::Error;
pub use message::{Message, Role, ToolCall, Usage};
pub use provider::{CompletionRequest, CompletionResponse, FinishReason, Provider};
pub use recommendation::{PriorityLevel, Recommendation, RecommendationSet, Timeframe};
pub use tool::{PropertySchema, Tool, ToolDefinition, ToolOutput, ToolParameters, ToolRegistry};
