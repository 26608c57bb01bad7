//! Tests for the reminder service facade and the reconciliation sweep.

use chrono::Duration;
use rstest::rstest;
use std::sync::Arc;

use crate::reminder::adapters::memory::{InMemoryKeyValueStorage, InMemoryNotificationCenter};
use crate::reminder::domain::{TaskDomainError, TaskId};
use crate::reminder::services::{
    NewTaskRequest, ReminderError, ReminderService, ScheduleWarning, TaskPatch, TaskStore,
    TaskStoreError,
};

use super::fixtures::{SteppingClock, TestHarness, base_now, harness};

fn request_due_in(rig: &TestHarness, minutes: i64, title: &str) -> NewTaskRequest {
    let due = rig.clock.now() + Duration::minutes(minutes);
    NewTaskRequest::new(title, due.date(), due.time())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn added_task_is_listed_and_scheduled() {
    let rig = harness();
    let mutation = rig
        .service
        .add_task(request_due_in(&rig, 5, "Pay rent"))
        .await
        .expect("add should succeed");

    let task = mutation.task();
    assert!(mutation.warning().is_none());
    assert_eq!(rig.service.milliseconds_until(task), 300_000);
    assert!(task.notification_handle().is_some());
    assert_eq!(rig.service.list_tasks().await, vec![task.clone()]);
    assert_eq!(rig.center.pending_count(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn past_due_pick_is_clamped_forward_one_minute() {
    let rig = harness();
    let mutation = rig
        .service
        .add_task(request_due_in(&rig, -5, "Missed it"))
        .await
        .expect("add should succeed");

    let task = mutation.task();
    assert_eq!(rig.service.milliseconds_until(task), 60_000);
    assert!(task.notification_handle().is_some());
    assert_eq!(rig.service.human_remaining(task), "1 minute");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn add_schedules_even_when_time_advances_between_clock_reads() {
    // The clock jumps two minutes per read, like a device clock ticking
    // while the user finishes the form. A task due in one minute must
    // still come back with a handle, not save silently.
    let storage = Arc::new(InMemoryKeyValueStorage::new());
    let center = Arc::new(InMemoryNotificationCenter::new());
    let clock = Arc::new(SteppingClock::at(base_now(), Duration::minutes(2)));
    let service = ReminderService::new(
        Arc::new(TaskStore::new(Arc::clone(&storage))),
        Arc::clone(&center),
        clock,
    );

    let due = base_now() + Duration::minutes(1);
    let mutation = service
        .add_task(NewTaskRequest::new("Racing the clock", due.date(), due.time()))
        .await
        .expect("add should succeed");

    assert!(mutation.task().notification_handle().is_some());
    assert!(mutation.warning().is_none());
    assert_eq!(center.pending_count(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_title_is_rejected() {
    let rig = harness();
    let result = rig.service.add_task(request_due_in(&rig, 5, "   ")).await;
    assert!(matches!(
        result,
        Err(ReminderError::Domain(TaskDomainError::EmptyTitle))
    ));
    assert!(rig.service.list_tasks().await.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn edit_pushes_the_reminder_back_with_exactly_one_live_handle() {
    let rig = harness();
    let created = rig
        .service
        .add_task(request_due_in(&rig, 5, "Pay rent"))
        .await
        .expect("add should succeed");
    let old_handle = created
        .task()
        .notification_handle()
        .cloned()
        .expect("handle expected");

    let later = rig.clock.now() + Duration::minutes(65);
    let edited = rig
        .service
        .edit_task(
            created.task().id(),
            TaskPatch::new()
                .with_due_date(later.date())
                .with_due_time(later.time()),
        )
        .await
        .expect("edit should succeed");

    let new_handle = edited
        .task()
        .notification_handle()
        .cloned()
        .expect("new handle expected");
    assert_ne!(old_handle, new_handle);
    assert_eq!(rig.center.pending_count(), 1);
    assert!(rig.center.pending(&old_handle).is_none());
    assert_eq!(rig.service.milliseconds_until(edited.task()), 3_900_000);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn edit_to_a_past_due_time_is_clamped_forward_one_minute() {
    let rig = harness();
    let created = rig
        .service
        .add_task(request_due_in(&rig, 60, "Moved back"))
        .await
        .expect("add should succeed");

    let past = rig.clock.now() - Duration::minutes(5);
    let edited = rig
        .service
        .edit_task(
            created.task().id(),
            TaskPatch::new()
                .with_due_date(past.date())
                .with_due_time(past.time()),
        )
        .await
        .expect("edit should succeed");

    assert_eq!(rig.service.milliseconds_until(edited.task()), 60_000);
    assert!(edited.task().notification_handle().is_some());
    assert!(edited.warning().is_none());
    assert_eq!(rig.center.pending_count(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn edit_of_unknown_task_is_not_found() {
    let rig = harness();
    let result = rig
        .service
        .edit_task(TaskId::new(), TaskPatch::new().with_title("Nope"))
        .await;
    assert!(matches!(
        result,
        Err(ReminderError::Store(TaskStoreError::NotFound(_)))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_cancels_the_notification_and_forgets_the_task() {
    let rig = harness();
    let created = rig
        .service
        .add_task(request_due_in(&rig, 5, "Short lived"))
        .await
        .expect("add should succeed");

    let warning = rig
        .service
        .delete_task(created.task().id())
        .await
        .expect("delete should succeed");

    assert!(warning.is_none());
    assert!(rig.service.list_tasks().await.is_empty());
    assert_eq!(rig.center.pending_count(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_with_a_failing_cancel_still_removes_but_warns() {
    let rig = harness();
    let created = rig
        .service
        .add_task(request_due_in(&rig, 5, "Sticky reminder"))
        .await
        .expect("add should succeed");

    rig.center.fail_next_cancels(2);
    let warning = rig
        .service
        .delete_task(created.task().id())
        .await
        .expect("delete should succeed");

    assert_eq!(warning, Some(ScheduleWarning::CancelFailed));
    assert!(rig.service.list_tasks().await.is_empty());
    // The cancel never went through, so the notification is still pending.
    assert_eq!(rig.center.pending_count(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn permission_denied_still_persists_the_task_with_a_warning() {
    let rig = harness();
    rig.center.deny_permission();

    let mutation = rig
        .service
        .add_task(request_due_in(&rig, 5, "Unnotified"))
        .await
        .expect("add should succeed");

    assert_eq!(mutation.warning(), Some(ScheduleWarning::PermissionDenied));
    assert!(mutation.task().notification_handle().is_none());
    assert_eq!(rig.service.list_tasks().await.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn scheduling_failure_after_retry_persists_the_task_with_a_warning() {
    let rig = harness();
    rig.center.fail_next_schedules(2);

    let mutation = rig
        .service
        .add_task(request_due_in(&rig, 5, "Degraded"))
        .await
        .expect("add should succeed");

    assert_eq!(mutation.warning(), Some(ScheduleWarning::SchedulingFailed));
    assert!(mutation.task().notification_handle().is_none());
    assert_eq!(rig.service.list_tasks().await.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_persist_cancels_the_fresh_notification() {
    let rig = harness();
    rig.storage.fail_next_sets(1);

    let result = rig.service.add_task(request_due_in(&rig, 5, "Lost")).await;

    assert!(matches!(
        result,
        Err(ReminderError::Store(TaskStoreError::Persistence(_)))
    ));
    assert!(rig.service.list_tasks().await.is_empty());
    assert_eq!(rig.center.pending_count(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sweep_removes_expired_tasks_and_their_notifications() {
    let rig = harness();
    rig.service
        .add_task(request_due_in(&rig, 5, "Soon"))
        .await
        .expect("add should succeed");
    let keeper = rig
        .service
        .add_task(request_due_in(&rig, 120, "Later"))
        .await
        .expect("add should succeed");

    rig.clock.advance(Duration::minutes(10));
    let report = rig.service.reconcile().await;

    assert_eq!(report.removed.len(), 1);
    assert_eq!(report.cancel_failures, 0);
    assert_eq!(report.persist_failures, 0);
    assert_eq!(rig.service.list_tasks().await, vec![keeper.task().clone()]);
    assert_eq!(rig.center.pending_count(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sweep_counts_cancel_failures_and_still_removes_the_task() {
    let rig = harness();
    rig.service
        .add_task(request_due_in(&rig, 5, "Stubborn"))
        .await
        .expect("add should succeed");
    rig.clock.advance(Duration::minutes(10));
    rig.center.fail_next_cancels(2);

    let report = rig.service.reconcile().await;

    assert_eq!(report.cancel_failures, 1);
    assert_eq!(report.removed.len(), 1);
    assert!(rig.service.list_tasks().await.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sweep_is_idempotent() {
    let rig = harness();
    rig.service
        .add_task(request_due_in(&rig, 5, "Soon"))
        .await
        .expect("add should succeed");
    rig.service
        .add_task(request_due_in(&rig, 120, "Later"))
        .await
        .expect("add should succeed");
    rig.clock.advance(Duration::minutes(10));

    rig.service.reconcile().await;
    let after_first = rig.service.list_tasks().await;
    let report = rig.service.reconcile().await;
    let after_second = rig.service.list_tasks().await;

    assert_eq!(after_first, after_second);
    assert!(report.removed.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delivery_receipt_retires_the_task() {
    let rig = harness();
    let created = rig
        .service
        .add_task(request_due_in(&rig, 5, "Pay rent"))
        .await
        .expect("add should succeed");

    let retired = rig
        .service
        .retire(created.task().id())
        .await
        .expect("retire should succeed");
    let again = rig
        .service
        .retire(created.task().id())
        .await
        .expect("retire should succeed");

    assert!(retired);
    assert!(!again);
    assert!(rig.service.list_tasks().await.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restore_drops_expired_tasks_and_heals_storage() {
    let rig = harness();
    rig.service
        .add_task(request_due_in(&rig, 1, "Gone A"))
        .await
        .expect("add should succeed");
    rig.service
        .add_task(request_due_in(&rig, 2, "Gone B"))
        .await
        .expect("add should succeed");
    let survivor = rig
        .service
        .add_task(request_due_in(&rig, 120, "Still here"))
        .await
        .expect("add should succeed");

    rig.clock.advance(Duration::minutes(10));
    let restored = rig.service.restore().await.expect("restore should succeed");

    assert_eq!(restored, vec![survivor.task().clone()]);
    assert_eq!(rig.service.list_tasks().await, restored);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_filters_titles_case_insensitively() {
    let rig = harness();
    rig.service
        .add_task(request_due_in(&rig, 5, "Pay rent"))
        .await
        .expect("add should succeed");
    rig.service
        .add_task(request_due_in(&rig, 10, "Water plants"))
        .await
        .expect("add should succeed");

    let hits = rig.service.search("RENT").await;
    assert_eq!(hits.len(), 1);
    let miss = rig.service.search("dentist").await;
    assert!(miss.is_empty());
}
