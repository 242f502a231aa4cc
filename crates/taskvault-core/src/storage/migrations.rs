//! Database schema migrations for taskvault.
//!
//! Migrations are versioned and applied automatically when opening the
//! database. The `schema_version` table tracks the current migration
//! version.

use rusqlite::{Connection, Result as SqliteResult};

/// Apply all pending migrations to bring the database to the current
/// schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// Create the schema_version table if it doesn't exist.
fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            0
        } else {
            eprintln!("Warning: failed to read schema_version: {}", e);
            0
        }
    })
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: initial schema.
///
/// Creates the `tasks` and `categories` tables plus the indexes backing
/// the bulk delete/query paths. Timestamps are epoch-millisecond
/// integers; gate flags and `completed` are 0/1 integers.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS tasks (
            id                      INTEGER PRIMARY KEY,
            name                    TEXT NOT NULL,
            completed               INTEGER NOT NULL DEFAULT 0,
            priority                INTEGER NOT NULL DEFAULT 1,
            category_id             INTEGER NOT NULL DEFAULT 0,
            has_due_date            INTEGER NOT NULL DEFAULT 0,
            has_final_due_date      INTEGER NOT NULL DEFAULT 0,
            is_repeating            INTEGER NOT NULL DEFAULT 0,
            has_stop_repeating_date INTEGER NOT NULL DEFAULT 0,
            repeat_unit             INTEGER NOT NULL DEFAULT 0,
            repeat_interval         INTEGER NOT NULL DEFAULT 1,
            date_created            INTEGER NOT NULL,
            date_modified           INTEGER NOT NULL,
            date_due                INTEGER NOT NULL DEFAULT 0,
            final_date_due          INTEGER NOT NULL DEFAULT 0,
            stop_repeating_date     INTEGER NOT NULL DEFAULT 0,
            notes                   TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS categories (
            id      INTEGER PRIMARY KEY,
            name    TEXT NOT NULL,
            color   INTEGER NOT NULL,
            updated INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_completed ON tasks(completed);
        CREATE INDEX IF NOT EXISTS idx_tasks_category ON tasks(category_id);",
    )?;

    set_schema_version(&tx, 1)?;

    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_from_scratch() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        assert_eq!(get_schema_version(&conn), 1);

        // Both tables exist and are queryable
        let task_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(task_count, 0);

        let category_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))
            .unwrap();
        assert_eq!(category_count, 0);
    }

    #[test]
    fn migrate_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        migrate(&conn).unwrap();
        migrate(&conn).unwrap();

        assert_eq!(get_schema_version(&conn), 1);
    }

    #[test]
    fn migrate_preserves_existing_rows() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        conn.execute(
            "INSERT INTO tasks (id, name, date_created, date_modified)
             VALUES (1, 'keep me', 1000, 1000)",
            [],
        )
        .unwrap();

        migrate(&conn).unwrap();

        let name: String = conn
            .query_row("SELECT name FROM tasks WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "keep me");
    }
}
