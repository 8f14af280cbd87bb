mod common;

use std::time::{Duration, Instant};

use discovery_core::{JobId, JobStatus, PollProfile};
use discovery_engine::{poll_until_terminal, FailureKind, PollOutcome};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use common::{fast_profile, init_logging, job, network_error, ScriptedClient};

#[tokio::test]
async fn polls_until_completed_and_reports_each_tick() {
    init_logging();
    let client = ScriptedClient::default().with_polls(vec![
        Ok(job("J1", JobStatus::Queued, "bolts", "usa")),
        Ok(job("J1", JobStatus::Processing, "bolts", "usa")),
        Ok(job("J1", JobStatus::Completed, "bolts", "usa")),
    ]);
    let cancel = CancellationToken::new();
    let mut ticks = Vec::new();

    let outcome = poll_until_terminal(
        &client,
        &JobId::new("J1"),
        &fast_profile(3),
        None,
        &cancel,
        |polls, job, progress| ticks.push((polls, job.status, progress)),
    )
    .await
    .unwrap();

    assert_eq!(
        outcome,
        PollOutcome::Completed(job("J1", JobStatus::Completed, "bolts", "usa"))
    );
    assert_eq!(
        ticks,
        vec![(1, JobStatus::Queued, 14), (2, JobStatus::Processing, 18)]
    );
    assert_eq!(client.count("poll J1"), 3);
}

#[tokio::test]
async fn failed_status_is_an_outcome_not_an_error() {
    init_logging();
    let client = ScriptedClient::default()
        .with_polls(vec![Ok(job("J2", JobStatus::Failed, "bolts", "usa"))]);
    let cancel = CancellationToken::new();

    let outcome = poll_until_terminal(
        &client,
        &JobId::new("J2"),
        &fast_profile(3),
        None,
        &cancel,
        |_, _, _| {},
    )
    .await
    .unwrap();

    assert!(matches!(outcome, PollOutcome::Failed(job) if job.id == JobId::new("J2")));
}

#[tokio::test]
async fn transient_errors_are_retried_within_budget() {
    init_logging();
    let client = ScriptedClient::default().with_polls(vec![
        Err(network_error("connection reset")),
        Err(network_error("connection reset")),
        Ok(job("J3", JobStatus::Processing, "bolts", "usa")),
        Err(network_error("connection reset")),
        Ok(job("J3", JobStatus::Completed, "bolts", "usa")),
    ]);
    let cancel = CancellationToken::new();

    let outcome = poll_until_terminal(
        &client,
        &JobId::new("J3"),
        &fast_profile(2),
        None,
        &cancel,
        |_, _, _| {},
    )
    .await
    .unwrap();

    assert!(matches!(outcome, PollOutcome::Completed(_)));
    assert_eq!(client.count("poll"), 5);
}

#[tokio::test]
async fn too_many_consecutive_errors_surface_the_last_one() {
    init_logging();
    let client = ScriptedClient::default().with_polls(vec![
        Err(network_error("first")),
        Err(network_error("second")),
        Err(network_error("third")),
    ]);
    let cancel = CancellationToken::new();

    let err = poll_until_terminal(
        &client,
        &JobId::new("J4"),
        &fast_profile(2),
        None,
        &cancel,
        |_, _, _| {},
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, FailureKind::Network);
    assert_eq!(err.message, "third");
}

#[tokio::test]
async fn debug_profile_stops_at_first_error() {
    init_logging();
    let client = ScriptedClient::default().with_polls(vec![
        Err(network_error("not found")),
        Ok(job("T9", JobStatus::Completed, "valve", "germany")),
    ]);
    let cancel = CancellationToken::new();
    let profile = PollProfile {
        interval: Duration::from_millis(5),
        ..PollProfile::debug()
    };

    let result = poll_until_terminal(
        &client,
        &JobId::new("T9"),
        &profile,
        None,
        &cancel,
        |_, _, _| {},
    )
    .await;

    assert!(result.is_err());
    assert_eq!(client.count("poll"), 1);
}

#[tokio::test]
async fn deadline_yields_timed_out() {
    init_logging();
    let client = ScriptedClient::default()
        .with_idle_status(job("J5", JobStatus::Processing, "bolts", "usa"));
    let cancel = CancellationToken::new();

    let outcome = poll_until_terminal(
        &client,
        &JobId::new("J5"),
        &fast_profile(3),
        Some(Duration::from_millis(40)),
        &cancel,
        |_, _, _| {},
    )
    .await
    .unwrap();

    match outcome {
        PollOutcome::TimedOut { polls } => {
            assert!(polls >= 1);
            assert_eq!(polls as usize, client.count("poll"));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn deadline_interrupts_a_slow_status_check() {
    init_logging();
    let client = ScriptedClient::default()
        .with_idle_status(job("J7", JobStatus::Processing, "bolts", "usa"))
        .with_poll_delay(Duration::from_secs(10));
    let cancel = CancellationToken::new();
    let started = Instant::now();

    let outcome = poll_until_terminal(
        &client,
        &JobId::new("J7"),
        &fast_profile(3),
        Some(Duration::from_millis(50)),
        &cancel,
        |_, _, _| {},
    )
    .await
    .unwrap();

    assert_eq!(outcome, PollOutcome::TimedOut { polls: 0 });
    assert_eq!(client.count("poll"), 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn deadline_interrupts_the_wait_between_checks() {
    init_logging();
    let client = ScriptedClient::default()
        .with_idle_status(job("J8", JobStatus::Queued, "bolts", "usa"));
    let cancel = CancellationToken::new();
    let profile = PollProfile {
        interval: Duration::from_secs(10),
        ..fast_profile(3)
    };
    let started = Instant::now();

    let outcome = poll_until_terminal(
        &client,
        &JobId::new("J8"),
        &profile,
        Some(Duration::from_millis(50)),
        &cancel,
        |_, _, _| {},
    )
    .await
    .unwrap();

    assert_eq!(outcome, PollOutcome::TimedOut { polls: 1 });
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn cancellation_stops_the_loop() {
    init_logging();
    let client = ScriptedClient::default()
        .with_idle_status(job("J6", JobStatus::Queued, "bolts", "usa"));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    let outcome = poll_until_terminal(
        &client,
        &JobId::new("J6"),
        &fast_profile(3),
        None,
        &cancel,
        |polls, _, _| {
            if polls == 2 {
                trigger.cancel();
            }
        },
    )
    .await
    .unwrap();

    assert_eq!(outcome, PollOutcome::Cancelled);
    assert_eq!(client.count("poll"), 2);
}
