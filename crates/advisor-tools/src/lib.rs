//! advisor-tools: Agent tools for alert-advisor
//!
//! This crate provides the tools the recommendation agent may call:
//! - Patterns: aggregate historical alerts into recurring patterns and effective actions
//! - Best practices: curated guidance per emergency type
//! - Retrieve: semantic search over an emergency management knowledge base

use std::sync::Arc;

use advisor_core::{HistoricalAlert, Tool, ToolRegistry};

pub mod best_practices;
pub mod patterns;
pub mod retrieve;

pub use best_practices::{best_practices, BestPracticesTool};
pub use patterns::{analyze_patterns, PatternAnalysisTool};
pub use retrieve::{KnowledgeBaseConfig, RetrieveTool};

/// Create the tool set for one request, binding its historical alerts.
pub fn create_advisor_tools(
    history: Vec<HistoricalAlert>,
    knowledge_base: Option<KnowledgeBaseConfig>,
) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(PatternAnalysisTool::new(history)),
        Arc::new(BestPracticesTool::new()),
        Arc::new(RetrieveTool::new(knowledge_base)),
    ]
}

/// Same as [`create_advisor_tools`], collected into a registry.
pub fn advisor_registry(
    history: Vec<HistoricalAlert>,
    knowledge_base: Option<KnowledgeBaseConfig>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for tool in create_advisor_tools(history, knowledge_base) {
        registry.register(tool);
    }
    registry
}
