use std::sync::Arc;

use chrono::{DateTime, Utc};
use governor::DefaultDirectRateLimiter;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::agents::{AgendaAgent, ChatAssistant};
use crate::config::Config;
use crate::llm::LLM;
use crate::middleware::llm_rate_limiter;
use crate::pipeline::UploadPipeline;
use crate::store::FileStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: FileStore,
    pub pipeline: Arc<UploadPipeline>,
    pub chat: Arc<ChatAssistant>,
    pub llm_limiter: Arc<DefaultDirectRateLimiter>,
}

impl AppState {
    pub fn new(config: Config, llm: LLM) -> Self {
        let store = FileStore::new();
        let agenda_agent = AgendaAgent::new(llm.clone(), &config.llm);
        let pipeline = Arc::new(UploadPipeline::new(agenda_agent, store.clone()));
        let chat = Arc::new(ChatAssistant::new(llm, &config.llm));
        let llm_limiter = llm_rate_limiter(config.rate_limit.llm_requests_per_minute);

        Self {
            config,
            store,
            pipeline,
            chat,
            llm_limiter,
        }
    }
}

// Agenda models mirror the JSON contract the generation service is asked to honor.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stakeholder {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub contribution: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AgendaTopic {
    pub id: String,
    #[validate(length(min = 1, message = "topic title must not be empty"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0, message = "topic duration must not be negative"))]
    pub duration_minutes: i64,
    pub presenter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Agenda {
    #[validate(length(min = 1, message = "agenda title must not be empty"))]
    pub title: String,
    pub objective: String,
    #[serde(default)]
    pub stakeholders: Vec<Stakeholder>,
    #[validate(nested)]
    pub topics: Vec<AgendaTopic>,
    #[validate(range(min = 0, message = "total duration must not be negative"))]
    pub total_duration_minutes: i64,
}

impl Agenda {
    /// Sum of the per-topic durations; `None` if it overflows
    pub fn topic_minutes(&self) -> Option<i64> {
        self.topics
            .iter()
            .try_fold(0i64, |acc, t| acc.checked_add(t.duration_minutes))
    }

    /// Returns `(declared, summed)` when the declared total disagrees with the topics.
    /// An overflowing sum is reported saturated.
    pub fn duration_mismatch(&self) -> Option<(i64, i64)> {
        let summed = self.topic_minutes().unwrap_or(i64::MAX);
        (summed != self.total_duration_minutes).then_some((self.total_duration_minutes, summed))
    }
}

/// One uploaded file with its normalized content and derived agenda
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Plain text, or base64 when the source was binary
    pub content: String,
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agenda: Option<Agenda>,
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            mime_type: mime_type.into(),
            content: content.into(),
            processed: false,
            agenda: None,
            created_at: Utc::now(),
        }
    }

    /// Attach the generated agenda; consumes the pending record so it happens once
    pub fn complete(mut self, agenda: Agenda) -> Self {
        self.agenda = Some(agenda);
        self.processed = true;
        self
    }
}

/// Record listing entry without the (possibly large) content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub processed: bool,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&FileRecord> for FileSummary {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            mime_type: record.mime_type.clone(),
            processed: record.processed,
            title: record.agenda.as_ref().map(|a| a.title.clone()),
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "model")]
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Unix milliseconds
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    pub files: Vec<FileSummary>,
    pub active_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetActiveRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: ChatMessage,
    pub active_file_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub processing: bool,
    pub files: usize,
}
