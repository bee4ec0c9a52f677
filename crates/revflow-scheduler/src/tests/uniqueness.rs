//! Uniqueness policy tests.

use super::{test_scheduler, wait_for, TestState, TEST_JOB_TYPE};
use crate::{JobBuilder, SchedulerError, UniquePolicy};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn drop_incoming_rejects_while_prior_is_live() {
    let state = TestState::new();
    let scheduler = test_scheduler(&state).await;

    JobBuilder::new(TEST_JOB_TYPE)
        .params(json!({"label": "first"}))
        .delay(Duration::from_millis(300))
        .unique("one-at-a-time", UniquePolicy::DropIncoming)
        .schedule(&scheduler)
        .await
        .unwrap();

    let err = JobBuilder::new(TEST_JOB_TYPE)
        .params(json!({"label": "second"}))
        .unique("one-at-a-time", UniquePolicy::DropIncoming)
        .schedule(&scheduler)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::Duplicate));

    // Only the first job ever runs.
    assert!(wait_for(|| state.completions() == vec![("first".to_string(), true)], 2000).await);
    assert_eq!(state.runs(), vec!["first"]);
}

#[tokio::test]
async fn reject_policy_leaves_the_prior_job_untouched() {
    let state = TestState::new();
    let scheduler = test_scheduler(&state).await;

    JobBuilder::new(TEST_JOB_TYPE)
        .params(json!({"label": "keeper"}))
        .delay(Duration::from_millis(200))
        .unique("guard", UniquePolicy::Reject)
        .schedule(&scheduler)
        .await
        .unwrap();

    let err = JobBuilder::new(TEST_JOB_TYPE)
        .params(json!({"label": "rejected"}))
        .unique("guard", UniquePolicy::Reject)
        .schedule(&scheduler)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::Duplicate));

    assert!(wait_for(|| state.completions() == vec![("keeper".to_string(), true)], 2000).await);
}

#[tokio::test]
async fn drop_existing_replaces_the_prior_job() {
    let state = TestState::new();
    let scheduler = test_scheduler(&state).await;

    JobBuilder::new(TEST_JOB_TYPE)
        .params(json!({"label": "old"}))
        .delay(Duration::from_secs(60))
        .unique("latest-wins", UniquePolicy::DropExisting)
        .schedule(&scheduler)
        .await
        .unwrap();

    JobBuilder::new(TEST_JOB_TYPE)
        .params(json!({"label": "new"}))
        .unique("latest-wins", UniquePolicy::DropExisting)
        .schedule(&scheduler)
        .await
        .unwrap();

    assert!(wait_for(|| state.completions().len() == 2, 3000).await);
    let completions = state.completions();
    assert!(completions.contains(&("old".to_string(), false)));
    assert!(completions.contains(&("new".to_string(), true)));
    assert_eq!(state.runs(), vec!["new"]);
}

#[tokio::test]
async fn unique_name_frees_up_after_terminal() {
    let state = TestState::new();
    let scheduler = test_scheduler(&state).await;

    JobBuilder::new(TEST_JOB_TYPE)
        .params(json!({"label": "round-1"}))
        .unique("recurring", UniquePolicy::DropIncoming)
        .schedule(&scheduler)
        .await
        .unwrap();

    assert!(wait_for(|| state.completions().len() == 1, 2000).await);

    // The name is released, so a new job under it is accepted.
    JobBuilder::new(TEST_JOB_TYPE)
        .params(json!({"label": "round-2"}))
        .unique("recurring", UniquePolicy::DropIncoming)
        .schedule(&scheduler)
        .await
        .unwrap();

    assert!(wait_for(|| state.completions().len() == 2, 2000).await);
    assert_eq!(state.runs(), vec!["round-1", "round-2"]);
}

#[tokio::test]
async fn different_unique_names_do_not_collide() {
    let state = TestState::new();
    let scheduler = test_scheduler(&state).await;

    JobBuilder::new(TEST_JOB_TYPE)
        .params(json!({"label": "a"}))
        .unique("name-a", UniquePolicy::DropIncoming)
        .schedule(&scheduler)
        .await
        .unwrap();
    JobBuilder::new(TEST_JOB_TYPE)
        .params(json!({"label": "b"}))
        .unique("name-b", UniquePolicy::DropIncoming)
        .schedule(&scheduler)
        .await
        .unwrap();

    assert!(wait_for(|| state.completions().len() == 2, 2000).await);
}
