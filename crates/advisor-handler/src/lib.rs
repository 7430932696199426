//! advisor-handler: recommendation handler for alert-advisor
//!
//! Validates `generateRecommendations` events, prompts the recommendation
//! agent with the per-request tool set, and maps the outcome to a
//! status-coded response.

pub mod config;
pub mod error;
pub mod event;
pub mod extract;
pub mod handler;
pub mod prompt;

pub use config::{Config, KnowledgeBaseSettings};
pub use error::HandlerError;
pub use event::{sample_event, HandlerResponse, RecommendationRequest, GENERATE_RECOMMENDATIONS};
pub use extract::{extract_recommendation, Extraction};
pub use handler::Handler;
pub use prompt::{build_prompt, SYSTEM_PROMPT};
