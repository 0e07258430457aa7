// Upload orchestration: extract → generate → store

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{error, info};

use crate::agents::AgendaAgent;
use crate::ingest::{ContentExtractor, UploadedFile};
use crate::models::FileRecord;
use crate::store::FileStore;
use crate::types::AppResult;

pub struct UploadPipeline {
    agenda_agent: AgendaAgent,
    store: FileStore,
    in_flight: Arc<AtomicUsize>,
}

/// Counts an upload as in flight until dropped
struct ProcessingGuard(Arc<AtomicUsize>);

impl ProcessingGuard {
    fn start(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl UploadPipeline {
    pub fn new(agenda_agent: AgendaAgent, store: FileStore) -> Self {
        Self {
            agenda_agent,
            store,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// True while any upload is between extraction and storage
    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Run one upload to completion. The store is touched only on full success,
    /// and the newly stored record becomes the active one.
    ///
    /// Uploads are independent: a later upload does not cancel an earlier one,
    /// so the store reflects completion order.
    pub async fn process(&self, file: UploadedFile) -> AppResult<FileRecord> {
        let _guard = ProcessingGuard::start(&self.in_flight);
        info!(file = %file.name, declared = %file.declared_type, size = file.data.len(), "Processing upload");

        let extracted = ContentExtractor::extract(&file).await.map_err(|e| {
            error!(file = %file.name, error = %e, "Content extraction failed");
            e
        })?;

        let record = FileRecord::new(&file.name, &extracted.mime_type, extracted.content);

        let agenda = self
            .agenda_agent
            .generate(&record.content, &record.name, &record.mime_type, extracted.is_text)
            .await
            .map_err(|e| {
                error!(file = %file.name, error = %e, "Agenda generation failed");
                e
            })?;

        let record = record.complete(agenda);
        self.store.insert_and_activate(record.clone()).await;

        info!(
            id = %record.id,
            file = %record.name,
            topics = record.agenda.as_ref().map_or(0, |a| a.topics.len()),
            "Upload processed"
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ingest::DOCX_MIME;
    use crate::llm::testing::{Behavior, ScriptedAdapter};
    use crate::models::Agenda;
    use crate::types::{AppError, GenerationError};
    use tokio::sync::oneshot;

    const Q3_AGENDA: &str = r#"{"title":"Q3 Budget Review","objective":"Align on budget","stakeholders":[],"topics":[{"id":"1","title":"Budget walkthrough","durationMinutes":15,"presenter":"TBD"}],"totalDurationMinutes":15}"#;

    fn pipeline(adapter: &Arc<ScriptedAdapter>) -> Arc<UploadPipeline> {
        let agent = AgendaAgent::new(adapter.llm(), &Config::default().llm);
        Arc::new(UploadPipeline::new(agent, FileStore::new()))
    }

    fn agenda_titled(title: &str) -> String {
        format!(
            r#"{{"title":"{}","objective":"o","stakeholders":[],"topics":[],"totalDurationMinutes":0}}"#,
            title
        )
    }

    #[tokio::test]
    async fn test_text_upload_end_to_end() {
        let adapter = ScriptedAdapter::replying(Q3_AGENDA);
        let pipeline = pipeline(&adapter);

        let record = pipeline
            .process(UploadedFile::new("notes.txt", "text/plain", "Discuss Q3 budget"))
            .await
            .unwrap();

        let all = pipeline.store().all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], record);
        assert_eq!(all[0].content, "Discuss Q3 budget");
        assert_eq!(all[0].mime_type, "text/plain");
        assert!(all[0].processed);
        assert_eq!(all[0].agenda, Some(serde_json::from_str::<Agenda>(Q3_AGENDA).unwrap()));
        assert_eq!(pipeline.store().active_id().await, Some(record.id));
        assert!(!pipeline.is_processing());
    }

    #[tokio::test]
    async fn test_binary_upload_stores_base64() {
        let adapter = ScriptedAdapter::replying(Q3_AGENDA);
        let pipeline = pipeline(&adapter);

        let record = pipeline
            .process(UploadedFile::new("scan.png", "image/png", vec![0u8, 1, 2]))
            .await
            .unwrap();

        assert_eq!(record.content, "AAEC");
        assert_eq!(record.mime_type, "image/png");
        assert!(adapter.last_request().unwrap().messages[0].content.has_inline_data());
    }

    #[tokio::test]
    async fn test_corrupted_docx_leaves_store_untouched() {
        let adapter = ScriptedAdapter::replying(Q3_AGENDA);
        let pipeline = pipeline(&adapter);
        pipeline
            .process(UploadedFile::new("first.txt", "text/plain", "hello"))
            .await
            .unwrap();
        let before = pipeline.store().all().await;

        let err = pipeline
            .process(UploadedFile::new("minutes.docx", DOCX_MIME, "PK but not really"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Extraction(_)));
        assert_eq!(pipeline.store().all().await, before);
        assert!(!pipeline.is_processing());
        // Extraction failed before any generation request went out
        assert_eq!(adapter.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_leaves_store_untouched() {
        let adapter = ScriptedAdapter::failing(GenerationError::Service {
            status: 503,
            message: "overloaded".to_string(),
        });
        let pipeline = pipeline(&adapter);

        let err = pipeline
            .process(UploadedFile::new("notes.txt", "text/plain", "Discuss Q3 budget"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Generation(GenerationError::Service { .. })));
        assert!(pipeline.store().is_empty().await);
        assert!(pipeline.store().active_id().await.is_none());
        assert!(!pipeline.is_processing());
    }

    #[tokio::test]
    async fn test_processing_flag_while_in_flight() {
        let adapter = Arc::new(ScriptedAdapter::new());
        let (release, gate) = oneshot::channel();
        adapter.when("slow.txt", Behavior::Gated(agenda_titled("Slow"), gate));
        let pipeline = pipeline(&adapter);

        let task = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                pipeline.process(UploadedFile::new("slow.txt", "text/plain", "x")).await
            })
        };

        while adapter.requests().is_empty() {
            tokio::task::yield_now().await;
        }
        assert!(pipeline.is_processing());

        release.send(()).unwrap();
        task.await.unwrap().unwrap();
        assert!(!pipeline.is_processing());
    }

    /// Issue A then B; release them in `release_order` and return (store names, active name)
    async fn race(release_order: [&str; 2]) -> (Vec<String>, String) {
        let adapter = Arc::new(ScriptedAdapter::new());
        let (release_a, gate_a) = oneshot::channel();
        let (release_b, gate_b) = oneshot::channel();
        adapter.when("a.txt", Behavior::Gated(agenda_titled("A"), gate_a));
        adapter.when("b.txt", Behavior::Gated(agenda_titled("B"), gate_b));
        let pipeline = pipeline(&adapter);

        let spawn = |name: &'static str| {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.process(UploadedFile::new(name, "text/plain", name)).await })
        };
        let task_a = spawn("a.txt");
        let task_b = spawn("b.txt");

        while adapter.requests().len() < 2 {
            tokio::task::yield_now().await;
        }

        let mut releases = vec![("a.txt", release_a, task_a), ("b.txt", release_b, task_b)];
        for name in release_order {
            let idx = releases.iter().position(|(n, _, _)| *n == name).unwrap();
            let (_, release, task) = releases.remove(idx);
            release.send(()).unwrap();
            task.await.unwrap().unwrap();
        }

        let names = pipeline.store().all().await.into_iter().map(|r| r.name).collect();
        let active = pipeline.store().get_active().await.unwrap().name;
        (names, active)
    }

    #[tokio::test]
    async fn test_store_order_follows_completion_order() {
        let (names, active) = race(["a.txt", "b.txt"]).await;
        assert_eq!(names, ["b.txt", "a.txt"]);
        assert_eq!(active, "b.txt");

        // B finishes before A: A, completing last, ends up first and active
        let (names, active) = race(["b.txt", "a.txt"]).await;
        assert_eq!(names, ["a.txt", "b.txt"]);
        assert_eq!(active, "a.txt");
    }
}
