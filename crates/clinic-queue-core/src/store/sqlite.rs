//! Document store backed by the local SQLite database.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::watch;

use super::{DocumentStore, StoreError, StoreResult};
use crate::db::Database;
use crate::models::{EntryUpdate, Employee, QueueEntry, ReferenceItem, ReferenceKind, Stats};

/// SQLite implementation of [`DocumentStore`].
///
/// Calls run on the caller's task; each is a short single-statement query.
pub struct SqliteDocumentStore {
    db: Mutex<Database>,
    stats_document_id: String,
    stats_tx: watch::Sender<Option<Stats>>,
}

impl SqliteDocumentStore {
    /// Wrap an open database. The stats subscription starts with the stored
    /// document, if any.
    pub fn new(db: Database, stats_document_id: impl Into<String>) -> StoreResult<Self> {
        let stats_document_id = stats_document_id.into();
        let initial = db.get_stats_document(&stats_document_id)?;
        let (stats_tx, _) = watch::channel(initial);

        Ok(Self {
            db: Mutex::new(db),
            stats_document_id,
            stats_tx,
        })
    }

    fn db(&self) -> StoreResult<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {}", e)))
    }

    /// Record a check-in. Check-in belongs to the kiosk; this exists for
    /// seeding and tests.
    pub fn insert_queue_entry(&self, entry: &QueueEntry) -> StoreResult<()> {
        self.db()?.insert_queue_entry(entry)?;
        Ok(())
    }

    /// Insert or update an employee record.
    pub fn upsert_employee(&self, employee: &Employee) -> StoreResult<()> {
        self.db()?.upsert_employee(employee)?;
        Ok(())
    }

    /// Write the stats document and push it to subscribers.
    pub fn publish_stats(&self, stats: &Stats) -> StoreResult<()> {
        self.db()?.put_stats_document(&self.stats_document_id, stats)?;
        self.stats_tx.send_replace(Some(stats.clone()));
        tracing::debug!(document = %self.stats_document_id, "Published stats document");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn list_queue(&self) -> StoreResult<Vec<QueueEntry>> {
        Ok(self.db()?.list_queue_entries()?)
    }

    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        Ok(self.db()?.list_employees()?)
    }

    async fn update_queue_entry(&self, id: &str, update: &EntryUpdate) -> StoreResult<()> {
        if self.db()?.update_queue_entry(id, update)? {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                collection: "queue",
                id: id.to_string(),
            })
        }
    }

    async fn list_reference(&self, kind: ReferenceKind) -> StoreResult<Vec<ReferenceItem>> {
        Ok(self.db()?.list_reference_items(kind)?)
    }

    async fn add_reference(&self, kind: ReferenceKind, name: &str) -> StoreResult<ReferenceItem> {
        let item = ReferenceItem::new(name.to_string());
        self.db()?.insert_reference_item(kind, &item)?;
        Ok(item)
    }

    async fn rename_reference(&self, kind: ReferenceKind, id: &str, name: &str) -> StoreResult<()> {
        if self.db()?.rename_reference_item(kind, id, name)? {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                collection: kind.collection(),
                id: id.to_string(),
            })
        }
    }

    async fn delete_reference(&self, kind: ReferenceKind, id: &str) -> StoreResult<()> {
        if self.db()?.delete_reference_item(kind, id)? {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                collection: kind.collection(),
                id: id.to_string(),
            })
        }
    }

    async fn get_stats(&self) -> StoreResult<Option<Stats>> {
        Ok(self.db()?.get_stats_document(&self.stats_document_id)?)
    }

    fn subscribe_stats(&self) -> watch::Receiver<Option<Stats>> {
        self.stats_tx.subscribe()
    }
}
