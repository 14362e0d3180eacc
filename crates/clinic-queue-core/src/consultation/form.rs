//! The consultation form: at most one open draft at a time.

use tracing::{debug, info};

use super::ConsultationDraft;
use crate::models::QueuedPatient;
use crate::queue::{QueueController, QueueError, QueueResult, QueueStore};

#[derive(Debug, Default)]
pub struct ConsultationForm {
    draft: Option<ConsultationDraft>,
}

impl ConsultationForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh draft for a patient in today's list. Any draft already
    /// open is discarded.
    pub async fn open(&mut self, queue: &QueueStore, entry_id: &str) -> QueueResult<&mut ConsultationDraft> {
        let patient = queue
            .patient(entry_id)
            .await
            .ok_or_else(|| QueueError::NotFound(entry_id.to_string()))?;

        if let Some(previous) = &self.draft {
            debug!(entry = %previous.entry_id, "Discarding open draft");
        }
        info!(entry = entry_id, queue_number = patient.queue_number(), "Opened consultation");

        Ok(self.draft.insert(ConsultationDraft::new(entry_id)))
    }

    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    pub fn draft(&self) -> Option<&ConsultationDraft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut ConsultationDraft> {
        self.draft.as_mut()
    }

    /// Replace the open draft's contents wholesale. The replacement must be
    /// for the same entry.
    pub fn replace(&mut self, draft: ConsultationDraft) -> QueueResult<()> {
        let open = self
            .draft
            .as_mut()
            .ok_or_else(|| QueueError::Validation("No consultation is open".into()))?;
        if open.entry_id != draft.entry_id {
            return Err(QueueError::Validation(format!(
                "Open consultation is for entry {}, not {}",
                open.entry_id, draft.entry_id
            )));
        }
        *open = draft;
        Ok(())
    }

    /// Save the open draft and complete the visit. The draft is closed only
    /// when the save succeeds.
    pub async fn save(&mut self, controller: &QueueController) -> QueueResult<QueuedPatient> {
        let draft = self
            .draft
            .as_ref()
            .ok_or_else(|| QueueError::Validation("No consultation is open".into()))?;

        let saved = controller.save(draft).await?;
        self.draft = None;
        Ok(saved)
    }

    /// Discard the open draft, if any.
    pub fn close(&mut self) -> Option<ConsultationDraft> {
        self.draft.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QueueEntry;
    use crate::queue::FixedClock;
    use crate::store::MemoryDocumentStore;
    use chrono::{Local, Utc};
    use std::sync::Arc;

    async fn setup() -> (Arc<QueueStore>, String) {
        let store = Arc::new(MemoryDocumentStore::new());
        let entry = QueueEntry::new("E1".into(), "1".into(), Utc::now());
        let id = entry.id.clone();
        store.insert_queue_entry(entry).unwrap();

        let queue = Arc::new(QueueStore::new(store, Arc::new(FixedClock::new(Local::now()))));
        queue.load_today().await.unwrap();
        (queue, id)
    }

    #[tokio::test]
    async fn test_open_unknown_entry_is_not_found() {
        let (queue, _) = setup().await;
        let mut form = ConsultationForm::new();
        assert!(matches!(
            form.open(&queue, "missing").await,
            Err(QueueError::NotFound(_))
        ));
        assert!(!form.is_open());
    }

    #[tokio::test]
    async fn test_open_replaces_previous_draft() {
        let (queue, id) = setup().await;
        let mut form = ConsultationForm::new();

        form.open(&queue, &id).await.unwrap().notes = "first".into();
        form.open(&queue, &id).await.unwrap();
        assert_eq!(form.draft().unwrap().notes, "");
    }

    #[tokio::test]
    async fn test_replace_requires_same_entry() {
        let (queue, id) = setup().await;
        let mut form = ConsultationForm::new();
        assert!(form.replace(ConsultationDraft::new(&id)).is_err());

        form.open(&queue, &id).await.unwrap();
        assert!(form.replace(ConsultationDraft::new("other")).is_err());

        let mut edited = ConsultationDraft::new(id.as_str());
        edited.notes = "Rest".into();
        form.replace(edited).unwrap();
        assert_eq!(form.draft().unwrap().notes, "Rest");
    }

    #[tokio::test]
    async fn test_close_discards() {
        let (queue, id) = setup().await;
        let mut form = ConsultationForm::new();
        form.open(&queue, &id).await.unwrap();

        assert!(form.close().is_some());
        assert!(form.close().is_none());
        assert!(!form.is_open());
    }
}
