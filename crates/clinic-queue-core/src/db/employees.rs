//! Employee database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::Employee;

impl Database {
    /// Insert or update an employee.
    pub fn upsert_employee(&self, employee: &Employee) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO employees (employee_id, name, gender, date_of_birth, updated_at)
            VALUES (?1, ?2, ?3, ?4, datetime('now'))
            ON CONFLICT(employee_id) DO UPDATE SET
                name = excluded.name,
                gender = excluded.gender,
                date_of_birth = excluded.date_of_birth,
                updated_at = datetime('now')
            "#,
            params![
                employee.employee_id,
                employee.name,
                employee.gender,
                employee.date_of_birth,
            ],
        )?;
        Ok(())
    }

    /// Get an employee by employee number.
    pub fn get_employee(&self, employee_id: &str) -> DbResult<Option<Employee>> {
        self.conn
            .query_row(
                r#"
                SELECT employee_id, name, gender, date_of_birth
                FROM employees
                WHERE employee_id = ?
                "#,
                [employee_id],
                |row| {
                    Ok(Employee {
                        employee_id: row.get(0)?,
                        name: row.get(1)?,
                        gender: row.get(2)?,
                        date_of_birth: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all employees.
    pub fn list_employees(&self) -> DbResult<Vec<Employee>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT employee_id, name, gender, date_of_birth
            FROM employees
            ORDER BY employee_id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Employee {
                employee_id: row.get(0)?,
                name: row.get(1)?,
                gender: row.get(2)?,
                date_of_birth: row.get(3)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
