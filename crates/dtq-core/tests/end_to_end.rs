//! End-to-end scenarios exercising `Coordinator` the way a real client,
//! worker and sweeper would drive it, without any transport in between.

use std::time::Duration;

use dtq_core::{Coordinator, CoreError, LeaseQueue, TaskStatus, TaskStore, WorkerRegistry};
use rstest::rstest;
use serde_json::json;

fn coordinator(default_lease_seconds: u32) -> Coordinator {
    Coordinator::new(
        WorkerRegistry::new(Duration::from_secs(15)),
        LeaseQueue::new(),
        TaskStore::new(),
        default_lease_seconds,
    )
}

#[tokio::test]
async fn scenario_happy_path_submit_pull_report_done() {
    let c = coordinator(20);
    let id = c
        .submit("add".into(), json!({"a": 2, "b": 3}), 3, None)
        .await
        .unwrap();

    c.registry().register("w1").await;
    let leased = c.pull_for_worker("w1").await.unwrap().unwrap();
    assert_eq!(leased.task_id, id);
    assert_eq!(leased.status, TaskStatus::Running);

    c.report("w1", id, true, Some(json!(5)), None).await;

    let done = c.get(id).await.unwrap();
    assert_eq!(done.status, TaskStatus::Done);
    assert_eq!(done.result, Some(json!(5)));
}

#[tokio::test]
async fn scenario_retry_then_success() {
    let c = coordinator(20);
    let id = c.submit("flaky".into(), json!({}), 2, None).await.unwrap();

    c.registry().register("w1").await;
    c.pull_for_worker("w1").await.unwrap();
    c.report("w1", id, false, None, Some("transient".into())).await;
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(c.get(id).await.unwrap().status, TaskStatus::Pending);

    let leased_again = c.pull_for_worker("w1").await.unwrap().unwrap();
    assert_eq!(leased_again.task_id, id);
    assert_eq!(leased_again.retry_count, 1);

    c.report("w1", id, true, Some(json!("ok")), None).await;
    assert_eq!(c.get(id).await.unwrap().status, TaskStatus::Done);
}

#[tokio::test]
async fn scenario_exhausts_retries_and_ends_failed() {
    let c = coordinator(20);
    let id = c.submit("flaky".into(), json!({}), 1, None).await.unwrap();
    c.registry().register("w1").await;

    // first attempt fails, within budget (max_retries=1)
    c.pull_for_worker("w1").await.unwrap();
    c.report("w1", id, false, None, Some("boom".into())).await;
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(c.get(id).await.unwrap().status, TaskStatus::Pending);

    // second attempt fails too, budget exhausted
    c.pull_for_worker("w1").await.unwrap();
    c.report("w1", id, false, None, Some("boom again".into())).await;

    let task = c.get(id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.retry_count, 2);
}

#[tokio::test]
async fn scenario_lease_timeout_is_reaped_and_requeued() {
    let c = coordinator(0); // immediate lease expiry
    let id = c
        .submit("slow".into(), json!({}), 3, Some(1))
        .await
        .unwrap();
    c.registry().register("w1").await;
    c.pull_for_worker("w1").await.unwrap();

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let swept = c.sweeper_tick().await;
    assert_eq!(swept.leases_expired, 1);
    assert_eq!(swept.requeued, 1);

    let task = c.get(id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.retry_count, 1);
    assert_eq!(task.last_error.as_deref(), Some("Lease expired (worker lost/timeout)"));
    // the corrected behavior: the original
    // owner's in_flight count is decremented by the sweep, not left
    // dangling until a heartbeat happens to fix it.
    assert_eq!(c.registry().stats().await.in_flight_total, 0);
}

#[tokio::test]
async fn scenario_stale_report_after_reap_is_ignored() {
    let c = coordinator(0);
    let id = c
        .submit("slow".into(), json!({}), 3, Some(1))
        .await
        .unwrap();
    c.registry().register("w1").await;
    c.pull_for_worker("w1").await.unwrap();

    tokio::time::sleep(Duration::from_millis(1100)).await;
    c.sweeper_tick().await;

    // the original worker finally reports in, long after the lease was
    // reclaimed and the task requeued. Its report must be a no-op.
    c.report("w1", id, true, Some(json!("too late")), None).await;

    let task = c.get(id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(task.result.is_none());
}

#[tokio::test]
async fn scenario_dead_worker_bookkeeping() {
    let reg = WorkerRegistry::new(Duration::from_millis(20));
    let c = Coordinator::new(reg, LeaseQueue::new(), TaskStore::new(), 20);

    c.registry().register("w1").await;
    c.submit("add".into(), json!({}), 3, None).await.unwrap();
    c.pull_for_worker("w1").await.unwrap();

    tokio::time::sleep(Duration::from_millis(40)).await;
    let dead = c.registry().dead_workers().await;
    assert_eq!(dead, vec!["w1".to_string()]);

    // in_flight bookkeeping survives independent of liveness until the
    // sweeper (or a report) reconciles the lease itself.
    assert_eq!(c.registry().stats().await.in_flight_total, 1);
}

#[rstest]
#[case(0)]
#[case(20)]
#[tokio::test]
async fn max_retries_boundary_values_are_accepted(#[case] max_retries: u32) {
    let c = coordinator(20);
    let result = c.submit("add".into(), json!({}), max_retries, None).await;
    assert!(result.is_ok());
}

#[rstest]
#[case(21)]
#[case(1000)]
#[tokio::test]
async fn max_retries_above_bound_is_rejected(#[case] max_retries: u32) {
    let c = coordinator(20);
    let result = c.submit("add".into(), json!({}), max_retries, None).await;
    assert!(matches!(result, Err(CoreError::InvalidMaxRetries(_))));
}

#[tokio::test]
async fn metrics_reflect_queue_store_and_registry_state() {
    let c = coordinator(20);
    c.submit("add".into(), json!({}), 3, None).await.unwrap();
    c.submit("add".into(), json!({}), 3, None).await.unwrap();
    c.registry().register("w1").await;
    c.pull_for_worker("w1").await.unwrap();

    let metrics = c.metrics().await;
    assert_eq!(metrics.tasks_total, 2);
    assert_eq!(metrics.queue_ready, 1);
    assert_eq!(metrics.queue_inflight, 1);
    assert_eq!(metrics.worker_stats.workers_total, 1);
}
