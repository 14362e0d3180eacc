//! In-memory mirror of today's queue.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::{Clock, QueueError, QueueResult};
use crate::models::{
    compare_queue_numbers, EntryUpdate, Employee, PatientInfo, QueueEntry, QueuedPatient, Stats,
};
use crate::store::DocumentStore;

/// State guarded by the queue lock.
#[derive(Debug, Default)]
pub struct QueueState {
    pub(super) patients: Vec<QueuedPatient>,
    pub(super) stats: Stats,
    /// Entry currently being announced. Local to this dashboard.
    pub(super) called: Option<String>,
}

impl QueueState {
    pub(super) fn position(&self, id: &str) -> Option<usize> {
        self.patients.iter().position(|p| p.id() == id)
    }

    pub(super) fn called_patient(&self) -> Option<&QueuedPatient> {
        let id = self.called.as_deref()?;
        self.patients.iter().find(|p| p.id() == id)
    }

    fn recompute_stats(&mut self) {
        self.stats = Stats::from_patients(&self.patients);
    }
}

/// Authoritative list of today's patients.
///
/// Every write to the mirror goes through one async lock, held across the
/// remote write and the local update, so a reload never observes a half
/// applied change.
pub struct QueueStore {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    state: Mutex<QueueState>,
}

impl QueueStore {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            state: Mutex::new(QueueState::default()),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Reload today's list from the `queue` and `employees` collections.
    ///
    /// On failure the previous list is kept.
    pub async fn load_today(&self) -> QueueResult<Vec<QueuedPatient>> {
        let mut state = self.state.lock().await;

        let queue = self.store.list_queue().await.map_err(|e| {
            warn!(error = %e, "Failed to read queue collection");
            QueueError::Persistence(e)
        })?;
        let employees = self.store.list_employees().await.map_err(|e| {
            warn!(error = %e, "Failed to read employees collection");
            QueueError::Persistence(e)
        })?;

        let today = self.clock.today();
        state.patients = build_today(queue, &employees, today);

        let still_callable = state
            .called_patient()
            .map(|p| !p.status().is_completed())
            .unwrap_or(false);
        if !still_callable {
            state.called = None;
        }
        state.recompute_stats();

        info!(
            date = %today,
            patients = state.patients.len(),
            "Loaded today's queue"
        );
        Ok(state.patients.clone())
    }

    /// Snapshot of today's list.
    pub async fn today(&self) -> Vec<QueuedPatient> {
        self.state.lock().await.patients.clone()
    }

    pub async fn patient(&self, id: &str) -> Option<QueuedPatient> {
        let state = self.state.lock().await;
        state.patients.iter().find(|p| p.id() == id).cloned()
    }

    pub async fn stats(&self) -> Stats {
        self.state.lock().await.stats.clone()
    }

    /// The entry currently designated as called, if any.
    pub async fn called(&self) -> Option<QueuedPatient> {
        self.state.lock().await.called_patient().cloned()
    }

    pub(super) async fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().await
    }

    /// Write a field-level update to one entry.
    ///
    /// `plan` sees the current entry and returns the update to write, or an
    /// error to abort. The mirror changes only after the store accepts the
    /// write. Status may only move forward and consultation data may only be
    /// attached once.
    pub(super) async fn apply<F>(&self, id: &str, plan: F) -> QueueResult<QueuedPatient>
    where
        F: FnOnce(&QueuedPatient) -> QueueResult<EntryUpdate> + Send,
    {
        let mut state = self.state.lock().await;

        let index = state
            .position(id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        let current = &state.patients[index];
        let update = plan(current)?;

        if update.is_empty() {
            return Ok(current.clone());
        }
        if let Some(next) = update.status {
            if next != current.status() && !current.status().can_advance_to(next) {
                return Err(QueueError::Validation(format!(
                    "Status cannot move from {} to {}",
                    current.status(),
                    next
                )));
            }
        }
        if update.consultation.is_some() && current.entry.consultation.is_some() {
            return Err(QueueError::Validation(format!(
                "Consultation already recorded for queue number {}",
                current.queue_number()
            )));
        }

        if let Err(e) = self.store.update_queue_entry(id, &update).await {
            warn!(entry = id, error = %e, "Queue update rejected by store");
            return Err(e.into());
        }

        let patient = &mut state.patients[index];
        update.apply_to(&mut patient.entry);
        let updated = patient.clone();

        if updated.status().is_completed() && state.called.as_deref() == Some(id) {
            state.called = None;
        }
        state.recompute_stats();

        info!(
            entry = id,
            queue_number = updated.queue_number(),
            status = %updated.status(),
            "Queue entry updated"
        );
        Ok(updated)
    }

    /// Replace the displayed stats with a pushed stats document.
    pub async fn apply_stats_push(&self, stats: Stats) {
        debug!(?stats, "Stats document pushed");
        self.state.lock().await.stats = stats;
    }

    /// Reload today's list every `period`. The first reload happens one
    /// period from now; failures are logged and the old list kept.
    pub fn spawn_periodic_reload(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(e) = queue.load_today().await {
                    warn!(error = %e, "Scheduled queue reload failed");
                }
            }
        })
    }

    /// Follow the stats document. The current document, if any, is applied
    /// immediately; the task ends when the store drops its sender.
    pub fn spawn_stats_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let queue = Arc::clone(self);
        let mut rx = self.store.subscribe_stats();

        tokio::spawn(async move {
            let initial = rx.borrow_and_update().clone();
            if let Some(stats) = initial {
                queue.apply_stats_push(stats).await;
            }

            while rx.changed().await.is_ok() {
                let pushed = rx.borrow_and_update().clone();
                if let Some(stats) = pushed {
                    queue.apply_stats_push(stats).await;
                }
            }
            debug!("Stats subscription closed");
        })
    }
}

/// Join today's queue entries with their employees, in queue order.
///
/// Entries created on other dates are dropped. Equal queue numbers keep
/// check-in order.
pub fn build_today(
    queue: Vec<QueueEntry>,
    employees: &[Employee],
    today: NaiveDate,
) -> Vec<QueuedPatient> {
    let by_id: HashMap<&str, &Employee> = employees
        .iter()
        .map(|e| (e.employee_id.as_str(), e))
        .collect();

    let mut patients: Vec<QueuedPatient> = queue
        .into_iter()
        .filter(|entry| entry.is_on(today))
        .map(|entry| {
            let employee = by_id.get(entry.employee_id.as_str()).copied();
            QueuedPatient {
                patient: PatientInfo::from_employee(employee, today),
                entry,
            }
        })
        .collect();

    patients.sort_by(|a, b| {
        compare_queue_numbers(a.queue_number(), b.queue_number())
            .then_with(|| a.entry.timestamp.cmp(&b.entry.timestamp))
    });

    for pair in patients.windows(2) {
        if compare_queue_numbers(pair[0].queue_number(), pair[1].queue_number()).is_eq() {
            warn!(queue_number = pair[0].queue_number(), "Duplicate queue number today");
        }
    }

    patients
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QueueStatus, NOT_AVAILABLE};
    use crate::queue::FixedClock;
    use crate::store::MemoryDocumentStore;
    use chrono::{Local, TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32) -> chrono::DateTime<Utc> {
        Local
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
    }

    #[test]
    fn test_build_today_filters_and_sorts() {
        let queue = vec![
            QueueEntry::new("E1".into(), "10".into(), at(2024, 6, 14, 9)),
            QueueEntry::new("E2".into(), "2".into(), at(2024, 6, 14, 8)),
            QueueEntry::new("E3".into(), "1".into(), at(2024, 6, 13, 9)),
            QueueEntry::new("E4".into(), "007".into(), at(2024, 6, 14, 10)),
        ];

        let patients = build_today(queue, &[], today());
        let numbers: Vec<&str> = patients.iter().map(|p| p.queue_number()).collect();
        assert_eq!(numbers, vec!["2", "007", "10"]);
    }

    #[test]
    fn test_build_today_joins_employees() {
        let mut employee = Employee::new("E1".into(), "Aisyah".into());
        employee.gender = Some("Female".into());
        employee.date_of_birth = Some("1990-06-15".into());

        let queue = vec![
            QueueEntry::new("E1".into(), "1".into(), at(2024, 6, 14, 9)),
            QueueEntry::new("E9".into(), "2".into(), at(2024, 6, 14, 9)),
        ];

        let patients = build_today(queue, &[employee], today());
        assert_eq!(patients[0].patient.name, "Aisyah");
        assert_eq!(patients[0].patient.age, Some(33));
        assert_eq!(patients[1].patient.name, NOT_AVAILABLE);
        assert_eq!(patients[1].patient.age, None);
    }

    #[tokio::test]
    async fn test_load_failure_keeps_previous_list() {
        let store = Arc::new(MemoryDocumentStore::new());
        store
            .insert_queue_entry(QueueEntry::new("E1".into(), "1".into(), Utc::now()))
            .unwrap();
        let clock = Arc::new(FixedClock::new(Local::now()));
        let queue = QueueStore::new(store.clone(), clock);

        assert_eq!(queue.load_today().await.unwrap().len(), 1);

        store.set_fail_reads(true);
        assert!(matches!(
            queue.load_today().await,
            Err(QueueError::Persistence(_))
        ));
        assert_eq!(queue.today().await.len(), 1);
    }

    #[tokio::test]
    async fn test_apply_unknown_id_is_not_found() {
        let store = Arc::new(MemoryDocumentStore::new());
        let queue = QueueStore::new(store, Arc::new(FixedClock::new(Local::now())));

        let result = queue
            .apply("missing", |_| Ok(EntryUpdate::status(QueueStatus::Completed)))
            .await;
        assert!(matches!(result, Err(QueueError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_apply_rejects_backward_status() {
        let store = Arc::new(MemoryDocumentStore::new());
        let entry = QueueEntry::new("E1".into(), "1".into(), Utc::now());
        let id = entry.id.clone();
        store.insert_queue_entry(entry).unwrap();
        let queue = QueueStore::new(store, Arc::new(FixedClock::new(Local::now())));
        queue.load_today().await.unwrap();

        queue
            .apply(&id, |_| Ok(EntryUpdate::status(QueueStatus::Completed)))
            .await
            .unwrap();
        let result = queue
            .apply(&id, |_| Ok(EntryUpdate::status(QueueStatus::Waiting)))
            .await;
        assert!(matches!(result, Err(QueueError::Validation(_))));
    }

    #[tokio::test]
    async fn test_stats_push_replaces_stats() {
        let store = Arc::new(MemoryDocumentStore::new());
        let queue = QueueStore::new(store, Arc::new(FixedClock::new(Local::now())));

        let pushed = Stats {
            new_patients: 12,
            ..Stats::default()
        };
        queue.apply_stats_push(pushed.clone()).await;
        assert_eq!(queue.stats().await, pushed);
    }
}
