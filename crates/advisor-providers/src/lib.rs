//! advisor-providers: hosted model providers for alert-advisor
//!
//! This crate provides implementations of the Provider trait for the hosted
//! reasoning models the recommendation agent runs on.

pub mod anthropic;

pub use anthropic::{AnthropicProvider, DEFAULT_MODEL};
