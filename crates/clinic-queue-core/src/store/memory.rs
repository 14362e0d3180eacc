//! In-memory document store.
//!
//! Holds the five collections in process. Hosts that bring their own data
//! seed it directly; tests use the failure switches to exercise the
//! persistence error path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::watch;

use super::{DocumentStore, StoreError, StoreResult};
use crate::models::{EntryUpdate, Employee, QueueEntry, ReferenceItem, ReferenceKind, Stats};

#[derive(Default)]
struct Collections {
    queue: Vec<QueueEntry>,
    employees: Vec<Employee>,
    diagnoses: Vec<ReferenceItem>,
    medicines: Vec<ReferenceItem>,
}

impl Collections {
    fn reference_mut(&mut self, kind: ReferenceKind) -> &mut Vec<ReferenceItem> {
        match kind {
            ReferenceKind::Diagnosis => &mut self.diagnoses,
            ReferenceKind::Medicine => &mut self.medicines,
        }
    }
}

/// [`DocumentStore`] kept entirely in memory.
///
/// Updates follow the same rules the SQLite schema enforces: status only
/// moves forward and consultation data is written once.
pub struct MemoryDocumentStore {
    collections: Mutex<Collections>,
    stats_tx: watch::Sender<Option<Stats>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        let (stats_tx, _) = watch::channel(None);
        Self {
            collections: Mutex::new(Collections::default()),
            stats_tx,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    fn collections(&self) -> StoreResult<MutexGuard<'_, Collections>> {
        self.collections
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {}", e)))
    }

    fn check_reads(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("Reads disabled".into()));
        }
        Ok(())
    }

    fn check_writes(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("Writes disabled".into()));
        }
        Ok(())
    }

    /// Make every subsequent read fail until switched back.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail until switched back.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn insert_queue_entry(&self, entry: QueueEntry) -> StoreResult<()> {
        self.collections()?.queue.push(entry);
        Ok(())
    }

    pub fn upsert_employee(&self, employee: Employee) -> StoreResult<()> {
        let mut collections = self.collections()?;
        match collections
            .employees
            .iter_mut()
            .find(|e| e.employee_id == employee.employee_id)
        {
            Some(existing) => *existing = employee,
            None => collections.employees.push(employee),
        }
        Ok(())
    }

    /// Current copy of one queue document.
    pub fn queue_entry(&self, id: &str) -> StoreResult<Option<QueueEntry>> {
        Ok(self.collections()?.queue.iter().find(|e| e.id == id).cloned())
    }

    /// Replace the stats document and push it to subscribers.
    pub fn publish_stats(&self, stats: Stats) {
        self.stats_tx.send_replace(Some(stats));
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list_queue(&self) -> StoreResult<Vec<QueueEntry>> {
        self.check_reads()?;
        Ok(self.collections()?.queue.clone())
    }

    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        self.check_reads()?;
        Ok(self.collections()?.employees.clone())
    }

    async fn update_queue_entry(&self, id: &str, update: &EntryUpdate) -> StoreResult<()> {
        self.check_writes()?;
        let mut collections = self.collections()?;
        let entry = collections
            .queue
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: "queue",
                id: id.to_string(),
            })?;

        if let Some(status) = update.status {
            if status != entry.status && !entry.status.can_advance_to(status) {
                return Err(StoreError::Rejected(format!(
                    "Status cannot move from {} to {}",
                    entry.status, status
                )));
            }
        }
        if update.consultation.is_some() && entry.consultation.is_some() {
            return Err(StoreError::Rejected(
                "Consultation data already recorded".into(),
            ));
        }

        update.apply_to(entry);
        Ok(())
    }

    async fn list_reference(&self, kind: ReferenceKind) -> StoreResult<Vec<ReferenceItem>> {
        self.check_reads()?;
        Ok(self.collections()?.reference_mut(kind).clone())
    }

    async fn add_reference(&self, kind: ReferenceKind, name: &str) -> StoreResult<ReferenceItem> {
        self.check_writes()?;
        let item = ReferenceItem::new(name.to_string());
        self.collections()?.reference_mut(kind).push(item.clone());
        Ok(item)
    }

    async fn rename_reference(&self, kind: ReferenceKind, id: &str, name: &str) -> StoreResult<()> {
        self.check_writes()?;
        let mut collections = self.collections()?;
        let item = collections
            .reference_mut(kind)
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: kind.collection(),
                id: id.to_string(),
            })?;
        item.name = name.to_string();
        Ok(())
    }

    async fn delete_reference(&self, kind: ReferenceKind, id: &str) -> StoreResult<()> {
        self.check_writes()?;
        let mut collections = self.collections()?;
        let items = collections.reference_mut(kind);
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Err(StoreError::NotFound {
                collection: kind.collection(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn get_stats(&self) -> StoreResult<Option<Stats>> {
        self.check_reads()?;
        Ok(self.stats_tx.borrow().clone())
    }

    fn subscribe_stats(&self) -> watch::Receiver<Option<Stats>> {
        self.stats_tx.subscribe()
    }
}
