//! Document store seam.
//!
//! The dashboard talks to a remote document database with five collections:
//! `queue`, `employees`, `diagnoses`, `medicines` and `stats`. Every call is
//! an explicit async operation returning a result; the aggregate stats
//! document can additionally be watched for pushes.

mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::db::DbError;
use crate::models::{EntryUpdate, Employee, QueueEntry, ReferenceItem, ReferenceKind, Stats};

/// Document store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: &'static str, id: String },

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Operations the queue core needs from the document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in `queue`.
    async fn list_queue(&self) -> StoreResult<Vec<QueueEntry>>;

    /// Every document in `employees`.
    async fn list_employees(&self) -> StoreResult<Vec<Employee>>;

    /// Point update of one queue document. Only the fields present in
    /// `update` are written.
    async fn update_queue_entry(&self, id: &str, update: &EntryUpdate) -> StoreResult<()>;

    /// Every item of a reference list, in insertion order.
    async fn list_reference(&self, kind: ReferenceKind) -> StoreResult<Vec<ReferenceItem>>;

    async fn add_reference(&self, kind: ReferenceKind, name: &str) -> StoreResult<ReferenceItem>;

    async fn rename_reference(&self, kind: ReferenceKind, id: &str, name: &str) -> StoreResult<()>;

    async fn delete_reference(&self, kind: ReferenceKind, id: &str) -> StoreResult<()>;

    /// Current aggregate stats document, if one exists.
    async fn get_stats(&self) -> StoreResult<Option<Stats>>;

    /// Subscribe to pushes of the aggregate stats document.
    fn subscribe_stats(&self) -> watch::Receiver<Option<Stats>>;
}
