//! Aggregate statistics documents.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::Stats;

impl Database {
    /// Write (or replace) a stats document.
    pub fn put_stats_document(&self, id: &str, stats: &Stats) -> DbResult<()> {
        let payload = serde_json::to_string(stats)?;
        self.conn.execute(
            r#"
            INSERT INTO stats (id, payload, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = datetime('now')
            "#,
            params![id, payload],
        )?;
        Ok(())
    }

    /// Read a stats document.
    pub fn get_stats_document(&self, id: &str) -> DbResult<Option<Stats>> {
        let payload: Option<String> = self
            .conn
            .query_row("SELECT payload FROM stats WHERE id = ?", [id], |row| row.get(0))
            .optional()?;

        Ok(payload.map(|p| serde_json::from_str(&p)).transpose()?)
    }
}
