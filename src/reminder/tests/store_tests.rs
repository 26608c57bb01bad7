//! Tests for the task store's persistence and rollback behaviour.

use async_trait::async_trait;
use chrono::Duration;
use mockall::mock;
use rstest::rstest;
use std::sync::Arc;

use crate::reminder::adapters::memory::InMemoryKeyValueStorage;
use crate::reminder::domain::{Task, TaskId, TaskTitle};
use crate::reminder::ports::{KeyValueStorage, StorageError, StorageResult, TASKS_KEY};
use crate::reminder::services::{TaskStore, TaskStoreError};

use super::fixtures::{TestClock, base_now};

mock! {
    Storage {}

    #[async_trait]
    impl KeyValueStorage for Storage {
        async fn get(&self, key: &str) -> StorageResult<Option<String>>;
        async fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    }
}

fn task_due_in(clock: &TestClock, minutes: i64, title: &str) -> Task {
    let due = clock.now() + Duration::minutes(minutes);
    Task::new(
        TaskTitle::new(title).expect("valid title"),
        None,
        due.date(),
        due.time(),
        clock.now(),
    )
}

fn store() -> (Arc<InMemoryKeyValueStorage>, TaskStore<InMemoryKeyValueStorage>, TestClock) {
    let storage = Arc::new(InMemoryKeyValueStorage::new());
    let task_store = TaskStore::new(Arc::clone(&storage));
    (storage, task_store, TestClock::at(base_now()))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn add_persists_and_lists_in_insertion_order() {
    let (storage, task_store, clock) = store();
    let first = task_due_in(&clock, 10, "First");
    let second = task_due_in(&clock, 20, "Second");

    task_store.add(first.clone()).await.expect("add should succeed");
    task_store.add(second.clone()).await.expect("add should succeed");

    let listed = task_store.list().await;
    assert_eq!(listed, vec![first, second]);
    let raw = storage.raw(TASKS_KEY).expect("task list should be persisted");
    assert!(raw.contains("First"));
    assert!(raw.contains("Second"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn add_rejects_duplicate_identifiers() {
    let (_, task_store, clock) = store();
    let task = task_due_in(&clock, 10, "Once");
    task_store.add(task.clone()).await.expect("add should succeed");

    let result = task_store.add(task.clone()).await;
    assert!(matches!(
        result,
        Err(TaskStoreError::DuplicateTask(id)) if id == task.id()
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_of_unknown_task_is_an_error() {
    let (_, task_store, clock) = store();
    let task = task_due_in(&clock, 10, "Ghost");

    let result = task_store.update(task.clone()).await;
    assert!(matches!(
        result,
        Err(TaskStoreError::NotFound(id)) if id == task.id()
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn remove_of_absent_id_is_a_noop() {
    let (_, task_store, _) = store();
    let removed = task_store.remove(TaskId::new()).await.expect("remove should succeed");
    assert!(removed.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_persist_rolls_back_an_add() {
    let (storage, task_store, clock) = store();
    let kept = task_due_in(&clock, 10, "Kept");
    task_store.add(kept.clone()).await.expect("add should succeed");
    let persisted_before = storage.raw(TASKS_KEY);

    storage.fail_next_sets(1);
    let rejected = task_due_in(&clock, 20, "Rejected");
    let result = task_store.add(rejected).await;

    assert!(matches!(result, Err(TaskStoreError::Persistence(_))));
    assert_eq!(task_store.list().await, vec![kept]);
    assert_eq!(storage.raw(TASKS_KEY), persisted_before);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_persist_rolls_back_a_remove() {
    let (storage, task_store, clock) = store();
    let task = task_due_in(&clock, 10, "Sticky");
    task_store.add(task.clone()).await.expect("add should succeed");

    storage.fail_next_sets(1);
    let result = task_store.remove(task.id()).await;

    assert!(matches!(result, Err(TaskStoreError::Persistence(_))));
    assert_eq!(task_store.list().await, vec![task]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn load_round_trips_a_saved_list() {
    let (storage, task_store, clock) = store();
    let first = task_due_in(&clock, 30, "Round");
    let second = task_due_in(&clock, 60, "Trip");
    task_store.add(first.clone()).await.expect("add should succeed");
    task_store.add(second.clone()).await.expect("add should succeed");

    let fresh = TaskStore::new(Arc::clone(&storage));
    let restored = fresh.load(clock.now()).await.expect("load should succeed");
    assert_eq!(restored, vec![first, second]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn load_drops_expired_tasks_and_repersists() {
    let (storage, task_store, clock) = store();
    let expired_a = task_due_in(&clock, 1, "Expired A");
    let expired_b = task_due_in(&clock, 2, "Expired B");
    let alive = task_due_in(&clock, 60, "Alive");
    for task in [expired_a, expired_b, alive.clone()] {
        task_store.add(task).await.expect("add should succeed");
    }

    clock.advance(Duration::minutes(5));
    let fresh = TaskStore::new(Arc::clone(&storage));
    let restored = fresh.load(clock.now()).await.expect("load should succeed");

    assert_eq!(restored, vec![alive.clone()]);
    let raw = storage.raw(TASKS_KEY).expect("healed list should be persisted");
    let healed: Vec<Task> = serde_json::from_str(&raw).expect("valid persisted JSON");
    assert_eq!(healed, vec![alive]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn load_with_empty_storage_yields_an_empty_list() {
    let (_, task_store, clock) = store();
    let restored = task_store.load(clock.now()).await.expect("load should succeed");
    assert!(restored.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn load_surfaces_storage_read_failures() {
    let mut storage = MockStorage::new();
    storage
        .expect_get()
        .withf(|key| key == TASKS_KEY)
        .returning(|_| Err(StorageError::backend(std::io::Error::other("read failed"))));

    let task_store = TaskStore::new(Arc::new(storage));
    let result = task_store.load(base_now()).await;
    assert!(matches!(result, Err(TaskStoreError::Persistence(_))));
}
