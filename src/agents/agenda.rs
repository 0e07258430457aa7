//! Agenda Agent
//!
//! Sends one document to the generation service and turns the JSON it returns
//! into a validated [`Agenda`]. A single attempt is made; any failure is
//! reported as a [`GenerationError`] and nothing is retried.

use serde_json::{json, Value};
use tracing::{info, warn};
use validator::Validate;

use crate::config::LLMConfig;
use crate::llm::LLM;
use crate::models::Agenda;
use crate::types::{AppResult, GenerationError, LLMMessage, LLMRequest};

const SYSTEM_INSTRUCTION: &str = r#"You are an expert meeting facilitator. Given a document, you design a focused meeting agenda that helps the relevant people act on it.

Rules:
- Identify the people or roles the document implies should attend and what each contributes.
- Break the discussion into concrete topics in the order they should be discussed.
- Give every topic a realistic duration in whole minutes.
- totalDurationMinutes must equal the sum of the topic durations.
- Use "TBD" as presenter when the document does not name one.
- Respond with a single JSON object and nothing else.

Example input: a one-page note titled "Website relaunch" asking design and engineering to agree on a launch date.
Example output:
{"title":"Website Relaunch Planning","objective":"Agree on a launch date and the work needed to hit it","stakeholders":[{"name":"Design Lead","role":"Design","contribution":"Presents final mockups"},{"name":"Engineering Lead","role":"Engineering","contribution":"Estimates remaining build work"}],"topics":[{"id":"1","title":"Mockup review","description":"Walk through the final page designs","durationMinutes":15,"presenter":"Design Lead"},{"id":"2","title":"Build estimate","description":"Remaining tasks and risks","durationMinutes":15,"presenter":"Engineering Lead"},{"id":"3","title":"Launch date","description":"Pick a date and owners","durationMinutes":10,"presenter":"TBD"}],"totalDurationMinutes":40}"#;

/// Response schema handed to the service, in its OpenAPI subset
pub fn agenda_schema() -> Value {
    let string = json!({"type": "STRING"});
    json!({
        "type": "OBJECT",
        "properties": {
            "title": string,
            "objective": string,
            "stakeholders": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": string,
                        "role": string,
                        "contribution": string
                    },
                    "required": ["name", "role", "contribution"]
                }
            },
            "topics": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": string,
                        "title": string,
                        "description": string,
                        "durationMinutes": {"type": "INTEGER"},
                        "presenter": string
                    },
                    "required": ["id", "title", "description", "durationMinutes", "presenter"]
                }
            },
            "totalDurationMinutes": {"type": "INTEGER"}
        },
        "required": ["title", "objective", "stakeholders", "topics", "totalDurationMinutes"]
    })
}

pub struct AgendaAgent {
    llm: LLM,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl AgendaAgent {
    pub fn new(llm: LLM, config: &LLMConfig) -> Self {
        Self {
            llm,
            model: config.agenda_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_output_tokens,
        }
    }

    /// Generate an agenda for one normalized document
    pub async fn generate(
        &self,
        content: &str,
        file_name: &str,
        mime_type: &str,
        is_text: bool,
    ) -> AppResult<Agenda> {
        let request = self.build_request(content, file_name, mime_type, is_text);
        let response = self.llm.create_chat_completion(&request).await?;

        info!(
            file = %file_name,
            provider = %self.llm.provider_name(),
            tokens = response.usage.total_tokens,
            finish_reason = %response.finish_reason,
            "Agenda generated"
        );

        Ok(parse_agenda(&response.content)?)
    }

    fn build_request(&self, content: &str, file_name: &str, mime_type: &str, is_text: bool) -> LLMRequest {
        let instructions = format!(
            "Create a meeting agenda for the document \"{}\" (type: {}).",
            file_name, mime_type
        );

        let message = if is_text {
            LLMMessage::user(format!("{}\n\nDOCUMENT CONTENT:\n{}", instructions, content))
        } else {
            LLMMessage::user_with_inline_data(instructions, content, mime_type)
        };

        let mut request = LLMRequest::new(self.model.clone(), vec![message]);
        request.system_instruction = Some(SYSTEM_INSTRUCTION.to_string());
        request.response_schema = Some(agenda_schema());
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;
        request
    }
}

/// Parse and validate the service's JSON reply
pub fn parse_agenda(raw: &str) -> Result<Agenda, GenerationError> {
    let json = strip_code_fence(raw);
    let agenda: Agenda =
        serde_json::from_str(json).map_err(|e| GenerationError::Schema(e.to_string()))?;
    agenda
        .validate()
        .map_err(|e| GenerationError::Schema(e.to_string()))?;
    if agenda.topic_minutes().is_none() {
        return Err(GenerationError::Schema(
            "topic durations overflow when summed".to_string(),
        ));
    }

    if let Some((declared, summed)) = agenda.duration_mismatch() {
        warn!(declared, summed, title = %agenda.title, "Agenda total duration differs from topic sum");
    }

    Ok(agenda)
}

/// Models occasionally wrap JSON in a ```json fence despite JSON mode
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    match inner.split_once('\n') {
        Some((lang, body)) if !lang.trim_start().starts_with('{') => body.trim(),
        _ => inner.trim(),
    }
}
