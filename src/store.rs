use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::FileRecord;
use crate::types::{AppError, AppResult};

#[derive(Debug, Default)]
struct StoreState {
    /// Most recent first
    records: Vec<FileRecord>,
    active_id: Option<String>,
}

/// Session file list plus the active selection.
///
/// Records are only ever prepended; there is no removal. The active id always
/// names a stored record.
#[derive(Clone, Default)]
pub struct FileStore {
    inner: Arc<RwLock<StoreState>>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_front(&self, record: FileRecord) {
        let mut guard = self.inner.write().await;
        guard.records.insert(0, record);
    }

    /// Select a stored record. Unknown ids are rejected and leave the selection as it was.
    pub async fn set_active(&self, id: &str) -> AppResult<()> {
        let mut guard = self.inner.write().await;
        if !guard.records.iter().any(|r| r.id == id) {
            return Err(AppError::NotFound(format!("file {}", id)));
        }
        guard.active_id = Some(id.to_string());
        Ok(())
    }

    /// Prepend and select in one step so no reader sees one without the other
    pub async fn insert_and_activate(&self, record: FileRecord) {
        let mut guard = self.inner.write().await;
        guard.active_id = Some(record.id.clone());
        guard.records.insert(0, record);
    }

    pub async fn get_active(&self) -> Option<FileRecord> {
        let guard = self.inner.read().await;
        let id = guard.active_id.as_deref()?;
        guard.records.iter().find(|r| r.id == id).cloned()
    }

    pub async fn active_id(&self) -> Option<String> {
        self.inner.read().await.active_id.clone()
    }

    pub async fn get(&self, id: &str) -> Option<FileRecord> {
        let guard = self.inner.read().await;
        guard.records.iter().find(|r| r.id == id).cloned()
    }

    pub async fn all(&self) -> Vec<FileRecord> {
        self.inner.read().await.records.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
