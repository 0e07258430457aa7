//! Content ingestion
//!
//! Turns an uploaded file into the `(content, mime_type, is_text)` triple the
//! generation service accepts. Exactly one of three branches handles a file,
//! checked in this order:
//!
//! 1. **Word** - `.docx` name or the WordprocessingML MIME type; plain text is
//!    pulled out of the document
//! 2. **Text** - `.txt`/`.md` name, or a MIME type mentioning text, json or
//!    markdown; bytes are decoded as text
//! 3. **Binary** - everything else; bytes are base64 encoded
//!
//! No file is rejected outright: unknown types land in the binary branch.

pub mod docx;

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};
use tracing::{debug, warn};

use crate::types::{AppError, AppResult};

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// A file as received from a client: name, declared type and raw bytes
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    /// MIME type reported by the client; may be empty
    pub declared_type: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, declaring the type a browser would infer from its extension
    pub async fn from_path(path: &Path, declared_type: Option<String>) -> AppResult<Self> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            AppError::InvalidRequest(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let declared_type = declared_type.unwrap_or_else(|| {
            mime_guess::from_path(path)
                .first()
                .map(|m| m.essence_str().to_string())
                .unwrap_or_default()
        });

        Ok(Self::new(name, declared_type, data))
    }
}

/// The handling path chosen for an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentBranch {
    WordDocument,
    Text,
    Binary,
}

impl ContentBranch {
    pub fn detect(file_name: &str, declared_type: &str) -> Self {
        let name = file_name.to_ascii_lowercase();
        let declared = declared_type.to_ascii_lowercase();

        if declared == DOCX_MIME || name.ends_with(".docx") {
            ContentBranch::WordDocument
        } else if declared.contains("text")
            || declared.contains("json")
            || declared.contains("markdown")
            || name.ends_with(".txt")
            || name.ends_with(".md")
        {
            ContentBranch::Text
        } else {
            ContentBranch::Binary
        }
    }
}

/// Normalized content ready for submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub content: String,
    pub mime_type: String,
    pub is_text: bool,
}

pub struct ContentExtractor;

impl ContentExtractor {
    pub async fn extract(file: &UploadedFile) -> AppResult<ExtractedContent> {
        let branch = ContentBranch::detect(&file.name, &file.declared_type);
        debug!(file = %file.name, declared = %file.declared_type, ?branch, size = file.data.len(), "Extracting content");

        match branch {
            ContentBranch::WordDocument => {
                let data = file.data.clone();
                let text = tokio::task::spawn_blocking(move || docx::extract_raw_text(&data))
                    .await
                    .map_err(|e| AppError::Internal(format!("Word extraction task failed: {}", e)))??;

                Ok(ExtractedContent {
                    content: text,
                    mime_type: mime::TEXT_PLAIN.essence_str().to_string(),
                    is_text: true,
                })
            }
            ContentBranch::Text => Ok(ExtractedContent {
                content: decode_text(&file.data, &file.declared_type),
                mime_type: non_empty_or(&file.declared_type, mime::TEXT_PLAIN.essence_str()),
                is_text: true,
            }),
            ContentBranch::Binary => Ok(ExtractedContent {
                content: encode_binary(&file.data),
                mime_type: non_empty_or(
                    &file.declared_type,
                    mime::APPLICATION_OCTET_STREAM.essence_str(),
                ),
                is_text: false,
            }),
        }
    }
}

fn non_empty_or(declared: &str, fallback: &str) -> String {
    if declared.trim().is_empty() {
        fallback.to_string()
    } else {
        declared.to_string()
    }
}

/// Decode text bytes in the declared charset (UTF-8 when absent or unknown).
/// A UTF-8 or UTF-16 BOM overrides the declared charset and is dropped.
/// Invalid sequences become U+FFFD.
fn decode_text(data: &[u8], declared_type: &str) -> String {
    let charset = declared_type
        .parse::<mime::Mime>()
        .ok()
        .and_then(|m| m.get_param(mime::CHARSET).map(|c| c.as_str().to_string()));
    let encoding = match charset {
        Some(label) => Encoding::for_label(label.as_bytes()).unwrap_or_else(|| {
            warn!(charset = %label, "Unknown charset, decoding as UTF-8");
            UTF_8
        }),
        None => UTF_8,
    };

    let (text, used, had_errors) = encoding.decode(data);
    if had_errors {
        debug!(encoding = used.name(), "Replaced malformed sequences while decoding text");
    }
    text.into_owned()
}

/// Base64 encode bytes; a body that already is a base64 data URL only loses its prefix
fn encode_binary(data: &[u8]) -> String {
    if let Some(payload) = std::str::from_utf8(data).ok().and_then(strip_data_url_prefix) {
        let payload = payload.trim();
        if BASE64.decode(payload).is_ok() {
            return payload.to_string();
        }
    }
    BASE64.encode(data)
}

/// `data:<type>;base64,<payload>` -> `<payload>`
pub fn strip_data_url_prefix(value: &str) -> Option<&str> {
    let rest = value.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    header.ends_with(";base64").then_some(payload)
}
