//! Queue entry database operations.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension};
use tracing::warn;

use super::{Database, DbError, DbResult};
use crate::models::{ConsultationData, EntryUpdate, QueueEntry, QueueStatus};

const QUEUE_COLUMNS: &str = "id, employee_id, queue_number, timestamp, status, time_in, time_out, consultation_data";

impl Database {
    /// Insert a queue entry (check-in).
    pub fn insert_queue_entry(&self, entry: &QueueEntry) -> DbResult<()> {
        let consultation_json = entry
            .consultation
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            r#"
            INSERT INTO queue (
                id, employee_id, queue_number, timestamp, status,
                time_in, time_out, consultation_data
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                entry.id,
                entry.employee_id,
                entry.queue_number,
                entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                entry.status.as_str(),
                entry.time_in,
                entry.time_out,
                consultation_json,
            ],
        )?;
        Ok(())
    }

    /// Get a queue entry by ID.
    pub fn get_queue_entry(&self, id: &str) -> DbResult<Option<QueueEntry>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM queue WHERE id = ?", QUEUE_COLUMNS),
                [id],
                QueueRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List every queue entry, oldest check-in first.
    ///
    /// Rows with an unreadable timestamp, an unknown status label or
    /// malformed consultation JSON are logged and skipped.
    pub fn list_queue_entries(&self) -> DbResult<Vec<QueueEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM queue ORDER BY timestamp",
            QUEUE_COLUMNS
        ))?;

        let rows = stmt.query_map([], QueueRow::from_row)?;

        let mut entries = Vec::new();
        for row in rows {
            let row = row?;
            let id = row.id.clone();
            match QueueEntry::try_from(row) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(entry = %id, error = %e, "Skipping unreadable queue row"),
            }
        }
        Ok(entries)
    }

    /// Apply a field-level update. Fields absent from `update` keep their
    /// stored value. Returns `false` when no entry has this ID.
    pub fn update_queue_entry(&self, id: &str, update: &EntryUpdate) -> DbResult<bool> {
        let consultation_json = update
            .consultation
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE queue SET
                status = COALESCE(?2, status),
                time_in = COALESCE(?3, time_in),
                time_out = COALESCE(?4, time_out),
                consultation_data = COALESCE(?5, consultation_data),
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                id,
                update.status.map(|s| s.as_str()),
                update.time_in,
                update.time_out,
                consultation_json,
            ],
        )?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct QueueRow {
    id: String,
    employee_id: String,
    queue_number: String,
    timestamp: String,
    status: Option<String>,
    time_in: Option<String>,
    time_out: Option<String>,
    consultation_data: Option<String>,
}

impl QueueRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            employee_id: row.get(1)?,
            queue_number: row.get(2)?,
            timestamp: row.get(3)?,
            status: row.get(4)?,
            time_in: row.get(5)?,
            time_out: row.get(6)?,
            consultation_data: row.get(7)?,
        })
    }
}

impl TryFrom<QueueRow> for QueueEntry {
    type Error = DbError;

    fn try_from(row: QueueRow) -> Result<Self, Self::Error> {
        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
            .map_err(|e| {
                DbError::Constraint(format!("Invalid timestamp on {}: {}", row.id, e))
            })?
            .with_timezone(&Utc);
        let status = string_to_status(row.status.as_deref())?;
        let consultation: Option<ConsultationData> = row
            .consultation_data
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(QueueEntry {
            id: row.id,
            employee_id: row.employee_id,
            queue_number: row.queue_number,
            timestamp,
            status,
            time_in: non_empty(row.time_in),
            time_out: non_empty(row.time_out),
            consultation,
        })
    }
}

/// A missing or blank status reads as `Waiting`.
fn string_to_status(s: Option<&str>) -> Result<QueueStatus, DbError> {
    match s.map(str::trim) {
        None | Some("") => Ok(QueueStatus::Waiting),
        Some(label) => QueueStatus::parse(label)
            .ok_or_else(|| DbError::Constraint(format!("Unknown queue status: {}", label))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
