//! Integration tests for the task/category store.
//!
//! These tests exercise the store through its public surface only:
//! durability across reopen, and id allocation under concurrent callers.

use std::sync::Arc;
use std::thread;

use taskvault_core::{Category, Priority, RepeatUnit, Task, TaskDb};

#[test]
fn tasks_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskvault.db");

    let stored = {
        let db = TaskDb::open_at(&path).unwrap();
        let mut task = Task::new("Renew passport");
        task.priority = Priority::High;
        task.is_repeating = true;
        task.repeat_unit = RepeatUnit::Years;
        task.repeat_interval = 10;
        task.notes = "bring photos".to_string();
        let stored = db.add_task(task).unwrap();
        db.add_category(Category::new("Paperwork", 0xFFAA_66CC)).unwrap();
        stored
    };

    let db = TaskDb::open_at(&path).unwrap();
    let tasks = db.list_tasks().unwrap();
    assert_eq!(tasks, vec![stored]);
    assert_eq!(db.list_category_names().unwrap(), vec!["Paperwork"]);
}

#[test]
fn reopen_continues_id_allocation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskvault.db");

    {
        let db = TaskDb::open_at(&path).unwrap();
        for name in ["a", "b", "c"] {
            db.add_task(Task::new(name)).unwrap();
        }
    }

    let db = TaskDb::open_at(&path).unwrap();
    assert_eq!(db.next_task_id().unwrap(), 4);
    let task = db.add_task(Task::new("d")).unwrap();
    assert_eq!(task.id, 4);
}

#[test]
fn concurrent_adds_allocate_distinct_ids() {
    let db = Arc::new(TaskDb::open_memory().unwrap());

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                (0..25)
                    .map(|i| {
                        db.add_task(Task::new(format!("task {worker}-{i}")))
                            .unwrap()
                            .id
                    })
                    .collect::<Vec<i64>>()
            })
        })
        .collect();

    let mut ids: Vec<i64> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(ids.len(), 200);
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 200);
    assert_eq!(db.next_task_id().unwrap(), 201);
}

#[test]
fn concurrent_category_adds_allocate_distinct_ids() {
    let db = Arc::new(TaskDb::open_memory().unwrap());

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                (0..10)
                    .map(|i| {
                        db.add_category(Category::new(format!("cat {worker}-{i}"), 0xFF00_0000))
                            .unwrap()
                            .id
                    })
                    .collect::<Vec<i64>>()
            })
        })
        .collect();

    let mut ids: Vec<i64> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();

    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 40);
}
