// Follow-up chat grounded on the active agenda

use tracing::info;

use crate::config::LLMConfig;
use crate::llm::LLM;
use crate::models::{Agenda, ChatMessage, ChatRole};
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest};

pub struct ChatAssistant {
    llm: LLM,
    model: String,
    temperature: Option<f32>,
}

impl ChatAssistant {
    pub fn new(llm: LLM, config: &LLMConfig) -> Self {
        Self {
            llm,
            model: config.chat_model.clone(),
            temperature: config.temperature,
        }
    }

    /// Answer `message` given the earlier turns and the agenda being discussed
    pub async fn reply(
        &self,
        agenda: Option<&Agenda>,
        history: &[ChatMessage],
        message: &str,
    ) -> AppResult<ChatMessage> {
        if message.trim().is_empty() {
            return Err(AppError::InvalidRequest("message must not be empty".to_string()));
        }

        let mut messages: Vec<LLMMessage> = history
            .iter()
            .map(|m| match m.role {
                ChatRole::User => LLMMessage::user(m.content.clone()),
                ChatRole::Assistant => LLMMessage::assistant(m.content.clone()),
            })
            .collect();
        messages.push(LLMMessage::user(message));

        let mut request = LLMRequest::new(self.model.clone(), messages);
        request.system_instruction = Some(Self::system_instruction(agenda));
        request.temperature = self.temperature;

        let response = self.llm.create_chat_completion(&request).await?;
        info!(
            history = history.len(),
            grounded = agenda.is_some(),
            tokens = response.usage.total_tokens,
            "Chat reply generated"
        );

        Ok(ChatMessage::new(ChatRole::Assistant, response.content.trim()))
    }

    fn system_instruction(agenda: Option<&Agenda>) -> String {
        match agenda.and_then(|a| serde_json::to_string_pretty(a).ok()) {
            Some(agenda_json) => format!(
                r#"You are a meeting assistant helping a user prepare for the meeting described by this agenda.

AGENDA:
{agenda_json}

GUIDELINES:
- Ground every answer in the agenda above
- Refer to topics and stakeholders by name
- If the agenda does not cover something, say so rather than guessing
- Keep answers short and practical"#
            ),
            None => "You are a meeting assistant. No agenda is loaded yet; ask the user to upload a document so an agenda can be generated, and answer general meeting-preparation questions briefly.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm::testing::ScriptedAdapter;
    use std::sync::Arc;

    fn assistant(adapter: &Arc<ScriptedAdapter>) -> ChatAssistant {
        ChatAssistant::new(adapter.llm(), &Config::default().llm)
    }

    fn agenda() -> Agenda {
        serde_json::from_str(r#"{"title":"Q3 Budget Review","objective":"Align on budget","stakeholders":[{"name":"Dana","role":"CFO","contribution":"Owns numbers"}],"topics":[{"id":"1","title":"Budget walkthrough","durationMinutes":15,"presenter":"Dana"}],"totalDurationMinutes":15}"#).unwrap()
    }

    #[tokio::test]
    async fn test_reply_is_grounded_on_agenda() {
        let adapter = ScriptedAdapter::replying("  Dana presents the walkthrough.  ");
        let history = vec![
            ChatMessage::new(ChatRole::User, "Hi"),
            ChatMessage::new(ChatRole::Assistant, "Hello!"),
        ];

        let reply = assistant(&adapter)
            .reply(Some(&agenda()), &history, "Who presents first?")
            .await
            .unwrap();

        assert_eq!(reply.role, ChatRole::Assistant);
        assert_eq!(reply.content, "Dana presents the walkthrough.");

        let request = adapter.last_request().unwrap();
        let system = request.system_instruction.unwrap();
        assert!(system.contains("Q3 Budget Review"));
        assert!(system.contains("Budget walkthrough"));

        let roles: Vec<_> = request.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["user", "assistant", "user"]);
        assert_eq!(request.messages[2].content.as_text(), Some("Who presents first?"));
        assert!(request.response_schema.is_none());
    }

    #[tokio::test]
    async fn test_reply_without_agenda() {
        let adapter = ScriptedAdapter::replying("Upload a document first.");
        assistant(&adapter).reply(None, &[], "What's on the agenda?").await.unwrap();

        let system = adapter.last_request().unwrap().system_instruction.unwrap();
        assert!(system.contains("No agenda is loaded"));
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let adapter = ScriptedAdapter::replying("unused");
        let err = assistant(&adapter).reply(None, &[], "   ").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert!(adapter.last_request().is_none());
    }
}
