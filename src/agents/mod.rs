//! Agent System
//!
//! The two LLM-backed agents of the assistant:
//!
//! - **Agenda Agent**: turns one normalized document into a structured agenda
//! - **Chat Assistant**: answers follow-up questions grounded on the active agenda
//!
//! ## Upload Flow
//!
//! ```text
//! Uploaded file
//!      │
//!      ▼
//! ┌─────────────┐
//! │   Content   │  → Word text / decoded text / base64
//! │  Extractor  │
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │   Agenda    │  → One schema-constrained generation call
//! │   Agent     │
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │ File Store  │  → Prepend record, make it active
//! └─────────────┘
//! ```

pub mod agenda;
pub mod chat;

pub use agenda::{agenda_schema, parse_agenda, AgendaAgent};
pub use chat::ChatAssistant;
