//! SQLite schema definition.

/// Complete database schema for the clinic queue.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Employees (reference data, owned by HR)
-- ============================================================================

CREATE TABLE IF NOT EXISTS employees (
    employee_id TEXT PRIMARY KEY,
    name TEXT,
    gender TEXT,
    date_of_birth TEXT,                          -- YYYY-MM-DD
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Queue (one row per visit)
-- ============================================================================

-- No foreign key on employee_id: check-in may reference an employee that
-- is not (yet) in the employees table.
CREATE TABLE IF NOT EXISTS queue (
    id TEXT PRIMARY KEY,
    employee_id TEXT NOT NULL,
    queue_number TEXT NOT NULL,
    timestamp TEXT NOT NULL,                     -- RFC 3339, UTC
    status TEXT NOT NULL DEFAULT 'Waiting',      -- Waiting, In Consultation, Completed
    time_in TEXT,
    time_out TEXT,
    consultation_data TEXT,                      -- JSON object, written once
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_queue_timestamp ON queue(timestamp);
CREATE INDEX IF NOT EXISTS idx_queue_status ON queue(status);

-- Status only moves forward. Legacy labels rank with the status they read as;
-- rewriting an unchanged label is allowed.
DROP TRIGGER IF EXISTS queue_status_forward;
CREATE TRIGGER queue_status_forward BEFORE UPDATE OF status ON queue
WHEN new.status IS NOT old.status
 AND (CASE lower(trim(new.status))
        WHEN 'waiting' THEN 0
        WHEN '' THEN 0
        WHEN 'in consultation' THEN 1
        WHEN 'being attended' THEN 1
        WHEN 'completed' THEN 2
        ELSE -1 END)
   < (CASE lower(trim(coalesce(old.status, '')))
        WHEN 'waiting' THEN 0
        WHEN '' THEN 0
        WHEN 'in consultation' THEN 1
        WHEN 'being attended' THEN 1
        WHEN 'completed' THEN 2
        ELSE 0 END)
BEGIN
    SELECT RAISE(ABORT, 'Queue status cannot move backwards');
END;

-- Consultation data is written once
CREATE TRIGGER IF NOT EXISTS queue_consultation_once BEFORE UPDATE OF consultation_data ON queue
WHEN old.consultation_data IS NOT NULL
 AND new.consultation_data IS NOT old.consultation_data
BEGIN
    SELECT RAISE(ABORT, 'Consultation data already recorded');
END;

-- ============================================================================
-- Reference lists
-- ============================================================================

CREATE TABLE IF NOT EXISTS diagnoses (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS medicines (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Aggregate statistics documents
-- ============================================================================

CREATE TABLE IF NOT EXISTS stats (
    id TEXT PRIMARY KEY,
    payload TEXT NOT NULL,                       -- JSON Stats object
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO queue (id, employee_id, queue_number, timestamp) VALUES ('q1', 'E1', '1', '2024-06-14T01:00:00Z')",
            [],
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_status_cannot_regress() {
        let conn = setup();

        let result = conn.execute("UPDATE queue SET status = 'Completed' WHERE id = 'q1'", []);
        assert!(result.is_ok());

        let result = conn.execute("UPDATE queue SET status = 'Waiting' WHERE id = 'q1'", []);
        assert!(result.is_err());

        let result = conn.execute("UPDATE queue SET status = 'In Consultation' WHERE id = 'q1'", []);
        assert!(result.is_err());

        // Re-writing the same status is fine
        let result = conn.execute("UPDATE queue SET status = 'Completed' WHERE id = 'q1'", []);
        assert!(result.is_ok());
    }

    #[test]
    fn test_legacy_status_updates() {
        let conn = setup();
        conn.execute(
            "INSERT INTO queue (id, employee_id, queue_number, timestamp, status) VALUES ('q2', 'E2', '2', '2024-06-14T01:05:00Z', 'Being Attended')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO queue (id, employee_id, queue_number, timestamp, status) VALUES ('q3', 'E3', '3', '2024-06-14T01:10:00Z', '')",
            [],
        )
        .unwrap();

        // Unchanged labels pass through a stamp-only update
        let result = conn.execute(
            "UPDATE queue SET status = COALESCE(NULL, status), time_out = '10:00:00' WHERE id IN ('q2', 'q3')",
            [],
        );
        assert!(result.is_ok(), "{:?}", result);

        let result = conn.execute("UPDATE queue SET status = 'Waiting' WHERE id = 'q2'", []);
        assert!(result.is_err());
        let result = conn.execute("UPDATE queue SET status = 'In Consultation' WHERE id = 'q2'", []);
        assert!(result.is_ok());

        let result = conn.execute("UPDATE queue SET status = 'In Consultation' WHERE id = 'q3'", []);
        assert!(result.is_ok());
        let result = conn.execute("UPDATE queue SET status = 'Completed' WHERE id = 'q3'", []);
        assert!(result.is_ok());
    }

    #[test]
    fn test_unknown_status_rejected() {
        let conn = setup();
        let result = conn.execute("UPDATE queue SET status = 'Cancelled' WHERE id = 'q1'", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_consultation_written_once() {
        let conn = setup();

        let result = conn.execute(
            "UPDATE queue SET consultation_data = '{\"notes\":\"first\"}' WHERE id = 'q1'",
            [],
        );
        assert!(result.is_ok());

        let result = conn.execute(
            "UPDATE queue SET consultation_data = '{\"notes\":\"second\"}' WHERE id = 'q1'",
            [],
        );
        assert!(result.is_err());

        // Unchanged value passes through a COALESCE-style update
        let result = conn.execute(
            "UPDATE queue SET consultation_data = COALESCE(NULL, consultation_data) WHERE id = 'q1'",
            [],
        );
        assert!(result.is_ok());
    }
}
