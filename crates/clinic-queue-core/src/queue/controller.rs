//! Visit state machine.

use std::sync::Arc;

use clinic_queue_announce::{Announcement, Announcer, AnnouncerConfig};
use tracing::{info, warn};

use super::{QueueError, QueueResult, QueueStore};
use crate::consultation::ConsultationDraft;
use crate::models::{EntryUpdate, QueueStatus, QueuedPatient};

/// Result of calling a patient: who was called and what was announced.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub patient: QueuedPatient,
    pub announcement: Announcement,
}

/// The only public path that changes a queue entry's status.
pub struct QueueController {
    queue: Arc<QueueStore>,
    announcer: Arc<dyn Announcer>,
    announcer_config: AnnouncerConfig,
}

impl QueueController {
    pub fn new(
        queue: Arc<QueueStore>,
        announcer: Arc<dyn Announcer>,
        announcer_config: AnnouncerConfig,
    ) -> Self {
        Self {
            queue,
            announcer,
            announcer_config,
        }
    }

    pub fn queue(&self) -> &Arc<QueueStore> {
        &self.queue
    }

    /// Call the waiting patient with the lowest queue number.
    ///
    /// Status is not changed; the patient stays `Waiting` until timed in, so
    /// calling again before then selects the same patient.
    pub async fn call_next(&self) -> QueueResult<CallOutcome> {
        let mut state = self.queue.lock().await;

        let mut waiting = state
            .patients
            .iter()
            .filter(|p| p.status() == QueueStatus::Waiting);
        let next = waiting
            .next()
            .ok_or_else(|| QueueError::Validation("No patients waiting".into()))?;

        if let Some(second) = waiting.next() {
            if second.entry.queue_value().is_some()
                && second.entry.queue_value() == next.entry.queue_value()
            {
                warn!(queue_number = next.queue_number(), "Duplicate waiting queue number");
                return Err(QueueError::Validation(format!(
                    "Queue number {} is assigned to more than one waiting patient",
                    next.queue_number()
                )));
            }
        }

        let announcement = self.announcement_for(next)?;
        let patient = next.clone();
        state.called = Some(patient.id().to_string());

        info!(
            entry = patient.id(),
            queue_number = patient.queue_number(),
            "Calling next patient"
        );
        self.announcer.announce(&announcement);

        Ok(CallOutcome {
            patient,
            announcement,
        })
    }

    /// Announce the called patient again.
    pub async fn repeat_call(&self) -> QueueResult<CallOutcome> {
        let state = self.queue.lock().await;

        let id = state
            .called
            .as_deref()
            .ok_or_else(|| QueueError::Validation("No patient has been called".into()))?;
        let patient = state
            .called_patient()
            .cloned()
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;

        let announcement = self.announcement_for(&patient)?;
        info!(queue_number = patient.queue_number(), "Repeating call");
        self.announcer.announce(&announcement);

        Ok(CallOutcome {
            patient,
            announcement,
        })
    }

    /// Patient arrived at the consultation room.
    pub async fn time_in(&self, id: &str) -> QueueResult<QueuedPatient> {
        let stamp = self.queue.clock().stamp();
        self.queue
            .apply(id, move |current| {
                require_status(current, QueueStatus::Waiting, "time in")?;
                Ok(EntryUpdate {
                    status: Some(QueueStatus::InConsultation),
                    time_in: Some(stamp),
                    ..Default::default()
                })
            })
            .await
    }

    /// Patient left the consultation room.
    pub async fn time_out(&self, id: &str) -> QueueResult<QueuedPatient> {
        let stamp = self.queue.clock().stamp();
        self.queue
            .apply(id, move |current| {
                require_status(current, QueueStatus::InConsultation, "time out")?;
                Ok(EntryUpdate {
                    status: Some(QueueStatus::Completed),
                    time_out: Some(stamp),
                    ..Default::default()
                })
            })
            .await
    }

    /// Mark complete without a consultation record.
    pub async fn tick(&self, id: &str) -> QueueResult<QueuedPatient> {
        self.queue
            .apply(id, |current| {
                reject_completed(current)?;
                Ok(EntryUpdate::status(QueueStatus::Completed))
            })
            .await
    }

    /// Attach the draft's consultation record and complete the visit.
    pub async fn save(&self, draft: &ConsultationDraft) -> QueueResult<QueuedPatient> {
        let consultation = draft.to_consultation_data();
        self.queue
            .apply(&draft.entry_id, move |current| {
                reject_completed(current)?;
                Ok(EntryUpdate {
                    status: Some(QueueStatus::Completed),
                    consultation: Some(consultation),
                    ..Default::default()
                })
            })
            .await
    }

    fn announcement_for(&self, patient: &QueuedPatient) -> QueueResult<Announcement> {
        Announcement::for_queue_number(patient.queue_number(), &self.announcer_config)
            .map_err(|e| QueueError::Validation(e.to_string()))
    }
}

fn require_status(current: &QueuedPatient, expected: QueueStatus, action: &str) -> QueueResult<()> {
    if current.status() != expected {
        return Err(QueueError::Validation(format!(
            "Cannot {} queue number {}: status is {}, expected {}",
            action,
            current.queue_number(),
            current.status(),
            expected
        )));
    }
    Ok(())
}

fn reject_completed(current: &QueuedPatient) -> QueueResult<()> {
    if current.status().is_completed() {
        return Err(QueueError::Validation(format!(
            "Queue number {} is already completed",
            current.queue_number()
        )));
    }
    Ok(())
}
