//! Today's queue and the transitions that move patients through it.
//!
//! [`QueueStore`] owns the in-memory mirror of today's list and is the only
//! writer of it. [`QueueController`] enforces the visit state machine on top:
//!
//! ```text
//! Waiting ──time_in──▶ In Consultation ──time_out──▶ Completed
//!    │                        │                          ▲
//!    └────────────tick / save─┴──────────────────────────┘
//! ```

mod clock;
mod controller;
mod store;

pub use clock::*;
pub use controller::*;
pub use store::*;

use thiserror::Error;

use crate::store::StoreError;

/// Errors reported to the action that triggered them. None is fatal and
/// the queue state is unchanged whenever one is returned.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Persistence error: {0}")]
    Persistence(#[source] StoreError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<StoreError> for QueueError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => {
                QueueError::NotFound(format!("{}/{}", collection, id))
            }
            other => QueueError::Persistence(other),
        }
    }
}

pub type QueueResult<T> = Result<T, QueueError>;
