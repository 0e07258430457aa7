// LLM abstraction layer

pub mod provider;
pub mod google;

pub use provider::*;
pub use crate::types::{LLMMessage, LLMRequest, LLMResponse, MessageContent, ContentPart, TokenUsage};

#[cfg(test)]
pub mod testing;
