//! Diagnosis and medicine reference-list operations.

use rusqlite::params;

use super::{Database, DbResult};
use crate::models::{ReferenceItem, ReferenceKind};

impl Database {
    /// List a reference list in insertion order.
    pub fn list_reference_items(&self, kind: ReferenceKind) -> DbResult<Vec<ReferenceItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, name FROM {} ORDER BY created_at, rowid",
            kind.collection()
        ))?;

        let rows = stmt.query_map([], |row| {
            Ok(ReferenceItem {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Insert a reference item.
    pub fn insert_reference_item(&self, kind: ReferenceKind, item: &ReferenceItem) -> DbResult<()> {
        self.conn.execute(
            &format!("INSERT INTO {} (id, name) VALUES (?1, ?2)", kind.collection()),
            params![item.id, item.name],
        )?;
        Ok(())
    }

    /// Rename a reference item.
    pub fn rename_reference_item(&self, kind: ReferenceKind, id: &str, name: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            &format!("UPDATE {} SET name = ?2 WHERE id = ?1", kind.collection()),
            params![id, name],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete a reference item.
    pub fn delete_reference_item(&self, kind: ReferenceKind, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?", kind.collection()),
            [id],
        )?;
        Ok(rows_affected > 0)
    }
}
