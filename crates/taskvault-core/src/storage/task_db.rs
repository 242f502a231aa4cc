//! SQLite-based store for task and category rows.
//!
//! [`TaskDb`] wraps one long-lived connection behind a mutex; every public
//! operation takes the lock, so operations are serialized and each one is
//! atomic. Id allocation happens inside the insert transaction, which
//! keeps concurrently created rows from colliding on the same id.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{data_dir, migrations};
use crate::category::Category;
use crate::error::{DatabaseError, Result, StoreError};
use crate::task::{Priority, RepeatUnit, Task};

/// A store collection with store-assigned integer ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Tasks,
    Categories,
}

/// Next free id in a table: `MAX(id) + 1`, 1 when the table is empty.
///
/// Computed fresh on every call, so it stays correct after arbitrary
/// deletions. Callers that insert must run this inside the same
/// transaction as the insert; [`TaskDb::add_task`] and
/// [`TaskDb::add_category`] do.
fn next_id(conn: &Connection, table: Table) -> rusqlite::Result<i64> {
    let sql = match table {
        Table::Tasks => "SELECT COALESCE(MAX(id), 0) + 1 FROM tasks",
        Table::Categories => "SELECT COALESCE(MAX(id), 0) + 1 FROM categories",
    };
    conn.query_row(sql, [], |row| row.get(0))
}

/// Build a Task from a row selected with [`TASK_COLUMNS`].
///
/// Columns are bound by name, so reordering the schema cannot silently
/// misassign fields. A cleared gate flag reads its timestamp as zero even
/// if the stored value is stale.
fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    let has_due_date: bool = row.get("has_due_date")?;
    let has_final_due_date: bool = row.get("has_final_due_date")?;
    let has_stop_repeating_date: bool = row.get("has_stop_repeating_date")?;

    Ok(Task {
        id: row.get("id")?,
        name: row.get("name")?,
        completed: row.get("completed")?,
        priority: Priority::from_i64(row.get("priority")?),
        category_id: row.get("category_id")?,
        has_due_date,
        has_final_due_date,
        is_repeating: row.get("is_repeating")?,
        has_stop_repeating_date,
        repeat_unit: RepeatUnit::from_i64(row.get("repeat_unit")?),
        repeat_interval: row.get("repeat_interval")?,
        date_created: row.get("date_created")?,
        date_modified: row.get("date_modified")?,
        date_due: if has_due_date { row.get("date_due")? } else { 0 },
        final_date_due: if has_final_due_date {
            row.get("final_date_due")?
        } else {
            0
        },
        stop_repeating_date: if has_stop_repeating_date {
            row.get("stop_repeating_date")?
        } else {
            0
        },
        notes: row.get("notes")?,
    })
}

/// Build a Category from a row selected with [`CATEGORY_COLUMNS`].
fn row_to_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        updated: row.get("updated")?,
    })
}

const TASK_COLUMNS: &str = "id, name, completed, priority, category_id,
    has_due_date, has_final_due_date, is_repeating, has_stop_repeating_date,
    repeat_unit, repeat_interval, date_created, date_modified,
    date_due, final_date_due, stop_repeating_date, notes";

const CATEGORY_COLUMNS: &str = "id, name, color, updated";

/// SQLite store for tasks and categories.
///
/// One instance owns one connection. For a process-wide handle use
/// [`super::shared`], which initializes a single instance exactly once.
pub struct TaskDb {
    conn: Mutex<Connection>,
}

impl TaskDb {
    /// Open the store at `~/.config/taskvault/taskvault.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("taskvault.db");
        Self::open_at(&path)
    }

    /// Open the store at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        Self::from_conn(conn)
    }

    /// Open an in-memory store (for tests and ephemeral use).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        Self::from_conn(conn)
    }

    fn from_conn(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Next id the tasks table would assign.
    ///
    /// Advisory: [`add_task`](Self::add_task) re-allocates inside its own
    /// transaction, so two concurrent creators never share an id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn next_task_id(&self) -> Result<i64> {
        Ok(next_id(&self.lock(), Table::Tasks)?)
    }

    /// Next id the categories table would assign. See
    /// [`next_task_id`](Self::next_task_id).
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn next_category_id(&self) -> Result<i64> {
        Ok(next_id(&self.lock(), Table::Categories)?)
    }

    // === Tasks ===

    /// Insert a task and return the stored row.
    ///
    /// The task is validated and normalized first. The id is allocated and
    /// the row inserted inside one transaction. Zero
    /// `date_created`/`date_modified` are filled with the current time;
    /// nonzero values are persisted verbatim.
    ///
    /// # Errors
    /// Returns a validation error for malformed input, or a database error
    /// if the insert fails.
    pub fn add_task(&self, task: Task) -> Result<Task> {
        let mut task = task.normalized()?;
        let now = Utc::now().timestamp_millis();
        if task.date_created == 0 {
            task.date_created = now;
        }
        if task.date_modified == 0 {
            task.date_modified = task.date_created;
        }

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        task.id = next_id(&tx, Table::Tasks)?;
        tx.execute(
            "INSERT INTO tasks (
                id, name, completed, priority, category_id,
                has_due_date, has_final_due_date, is_repeating,
                has_stop_repeating_date, repeat_unit, repeat_interval,
                date_created, date_modified, date_due, final_date_due,
                stop_repeating_date, notes
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                task.id,
                task.name,
                task.completed,
                task.priority.as_i64(),
                task.category_id,
                task.has_due_date,
                task.has_final_due_date,
                task.is_repeating,
                task.has_stop_repeating_date,
                task.repeat_unit.as_i64(),
                task.repeat_interval,
                task.date_created,
                task.date_modified,
                task.date_due,
                task.final_date_due,
                task.stop_repeating_date,
                task.notes,
            ],
        )?;
        tx.commit()?;
        Ok(task)
    }

    /// Get a task by id.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if no such row exists.
    pub fn get_task(&self, id: i64) -> Result<Task> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"))?;
        let task = stmt.query_row(params![id], row_to_task).optional()?;
        task.ok_or(StoreError::NotFound { entity: "task", id })
    }

    /// List every task, ordered by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id"))?;
        let tasks = stmt.query_map([], row_to_task)?;
        Ok(tasks.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Replace every mutable field of the row matching `task.id`.
    ///
    /// Returns the number of rows affected: 0 when the id does not exist
    /// (a no-op, not an error).
    ///
    /// # Errors
    /// Returns a validation error for malformed input, or a database error
    /// if the update fails.
    pub fn update_task(&self, task: &Task) -> Result<usize> {
        let task = task.clone().normalized()?;
        let conn = self.lock();
        let affected = conn.execute(
            "UPDATE tasks
             SET name = ?1, completed = ?2, priority = ?3, category_id = ?4,
                 has_due_date = ?5, has_final_due_date = ?6, is_repeating = ?7,
                 has_stop_repeating_date = ?8, repeat_unit = ?9,
                 repeat_interval = ?10, date_created = ?11, date_modified = ?12,
                 date_due = ?13, final_date_due = ?14, stop_repeating_date = ?15,
                 notes = ?16
             WHERE id = ?17",
            params![
                task.name,
                task.completed,
                task.priority.as_i64(),
                task.category_id,
                task.has_due_date,
                task.has_final_due_date,
                task.is_repeating,
                task.has_stop_repeating_date,
                task.repeat_unit.as_i64(),
                task.repeat_interval,
                task.date_created,
                task.date_modified,
                task.date_due,
                task.final_date_due,
                task.stop_repeating_date,
                task.notes,
                task.id,
            ],
        )?;
        Ok(affected)
    }

    /// Delete the task with the given id.
    ///
    /// Returns the number of rows removed; a missing id is a no-op.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn delete_task(&self, id: i64) -> Result<usize> {
        let conn = self.lock();
        Ok(conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?)
    }

    /// Delete every completed task, returning how many were removed.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn delete_completed_tasks(&self) -> Result<usize> {
        let conn = self.lock();
        Ok(conn.execute("DELETE FROM tasks WHERE completed = 1", [])?)
    }

    /// Delete every task, returning how many were removed.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn delete_all_tasks(&self) -> Result<usize> {
        let conn = self.lock();
        Ok(conn.execute("DELETE FROM tasks", [])?)
    }

    // === Categories ===

    /// Insert a category and return the stored row.
    ///
    /// Same id-allocation discipline as [`add_task`](Self::add_task).
    ///
    /// # Errors
    /// Returns a validation error for malformed input, or a database error
    /// if the insert fails.
    pub fn add_category(&self, category: Category) -> Result<Category> {
        let mut category = category.normalized()?;
        if category.updated == 0 {
            category.updated = Utc::now().timestamp_millis();
        }

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        category.id = next_id(&tx, Table::Categories)?;
        tx.execute(
            "INSERT INTO categories (id, name, color, updated) VALUES (?1, ?2, ?3, ?4)",
            params![category.id, category.name, category.color, category.updated],
        )?;
        tx.commit()?;
        Ok(category)
    }

    /// Get a category by id.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if no such row exists.
    pub fn get_category(&self, id: i64) -> Result<Category> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"
        ))?;
        let category = stmt.query_row(params![id], row_to_category).optional()?;
        category.ok_or(StoreError::NotFound {
            entity: "category",
            id,
        })
    }

    /// List every category, ordered by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY id"
        ))?;
        let categories = stmt.query_map([], row_to_category)?;
        Ok(categories.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// List category names only, in the same order as
    /// [`list_categories`](Self::list_categories).
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_category_names(&self) -> Result<Vec<String>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT name FROM categories ORDER BY id")?;
        let names = stmt.query_map([], |row| row.get(0))?;
        Ok(names.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Replace every mutable field of the row matching `category.id`.
    ///
    /// Returns the number of rows affected: 0 when the id does not exist.
    ///
    /// # Errors
    /// Returns a validation error for malformed input, or a database error
    /// if the update fails.
    pub fn update_category(&self, category: &Category) -> Result<usize> {
        let category = category.clone().normalized()?;
        let conn = self.lock();
        let affected = conn.execute(
            "UPDATE categories SET name = ?1, color = ?2, updated = ?3 WHERE id = ?4",
            params![category.name, category.color, category.updated, category.id],
        )?;
        Ok(affected)
    }

    /// Delete the category with the given id.
    ///
    /// Returns the number of rows removed; a missing id is a no-op. Tasks
    /// referencing the deleted category keep their `category_id` as-is;
    /// re-pointing them is the caller's responsibility.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn delete_category(&self, id: i64) -> Result<usize> {
        let conn = self.lock();
        Ok(conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?)
    }
}
