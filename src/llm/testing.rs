// Scripted adapter for exercising agents and the upload pipeline without a network

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::llm::{LLMAdapter, LLM};
use crate::types::{AppResult, GenerationError, LLMRequest, LLMResponse, TokenUsage};

pub enum Behavior {
    Reply(String),
    Fail(GenerationError),
    /// Reply only once the paired sender fires (or is dropped)
    Gated(String, oneshot::Receiver<()>),
}

/// Answers requests whose text mentions a key with the behavior scripted for it.
/// Each rule is used once; requests matching no rule get the fallback reply.
pub struct ScriptedAdapter {
    rules: Mutex<Vec<(String, Behavior)>>,
    fallback: Option<String>,
    requests: Mutex<Vec<LLMRequest>>,
}

impl ScriptedAdapter {
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(body: &str) -> Arc<Self> {
        Arc::new(Self {
            fallback: Some(body.to_string()),
            ..Self::new()
        })
    }

    pub fn failing(err: GenerationError) -> Arc<Self> {
        let adapter = Self::new();
        adapter.when("", Behavior::Fail(err));
        Arc::new(adapter)
    }

    pub fn when(&self, key: &str, behavior: Behavior) {
        self.rules.lock().unwrap().push((key.to_string(), behavior));
    }

    pub fn requests(&self) -> Vec<LLMRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<LLMRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn llm(self: &Arc<Self>) -> LLM {
        LLM::from_adapter(self.clone(), "scripted")
    }
}

fn request_text(request: &LLMRequest) -> String {
    request
        .messages
        .iter()
        .filter_map(|m| m.content.as_text())
        .collect::<Vec<_>>()
        .join("\n")
}

fn reply(body: String) -> AppResult<LLMResponse> {
    Ok(LLMResponse {
        content: body,
        finish_reason: "STOP".to_string(),
        usage: TokenUsage::default(),
    })
}

#[async_trait]
impl LLMAdapter for ScriptedAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let text = request_text(request);
        let behavior = {
            let mut rules = self.rules.lock().unwrap();
            rules
                .iter()
                .position(|(key, _)| text.contains(key.as_str()))
                .map(|idx| rules.remove(idx).1)
        };

        match behavior {
            Some(Behavior::Reply(body)) => reply(body),
            Some(Behavior::Fail(err)) => Err(err.into()),
            Some(Behavior::Gated(body, gate)) => {
                let _ = gate.await;
                reply(body)
            }
            None => match &self.fallback {
                Some(body) => reply(body.clone()),
                None => Err(GenerationError::EmptyResponse.into()),
            },
        }
    }
}
