mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{init_logging, poll_error, status, FakeApi, RecordingSink};
use crawl_core::{JobPhase, Msg, Severity};
use crawl_engine::{ControllerSettings, FailureKind, JobController, StartAccepted, StartError};
use tokio_util::sync::CancellationToken;

fn controller_with(api: Arc<FakeApi>) -> (JobController, RecordingSink) {
    let sink = RecordingSink::default();
    let controller = JobController::new(api, ControllerSettings::default(), Box::new(sink.clone()));
    (controller, sink)
}

/// Dispatches messages until nothing arrives for a short while.
async fn settle(controller: &mut JobController) {
    while let Ok(true) =
        tokio::time::timeout(Duration::from_millis(50), controller.step()).await
    {}
}

fn assert_polling_matches_running(controller: &JobController) {
    assert_eq!(
        controller.state().is_running,
        controller.poller_active(),
        "is_running and poller activity diverged in phase {:?}",
        controller.phase()
    );
}

#[tokio::test(start_paused = true)]
async fn start_poll_and_complete() {
    init_logging();
    let api = Arc::new(
        FakeApi::new()
            .with_start(Ok(StartAccepted::default()))
            .with_statuses(vec![
                Ok(status(true, 40, "working")),
                Ok(status(false, 100, "done")),
            ]),
    );
    let (mut controller, sink) = controller_with(api.clone());
    let record = sink.record();

    controller.dispatch(Msg::StartClicked { target_count: 1000 });
    assert_eq!(controller.phase(), JobPhase::Starting);
    assert_eq!(controller.state().target_count, 1000);

    assert!(controller.step().await);
    assert_eq!(controller.phase(), JobPhase::Running);
    assert!(controller.state().is_running);
    assert!(controller.poller_active());
    assert_polling_matches_running(&controller);

    assert!(controller.step().await);
    assert_eq!(controller.state().progress, 40);
    assert_eq!(controller.state().message, "working");
    assert_polling_matches_running(&controller);

    assert!(controller.step().await);
    assert_eq!(controller.phase(), JobPhase::Idle);
    assert!(!controller.state().is_running);
    assert_eq!(controller.state().progress, 100);
    assert!(!controller.poller_active());
    assert_polling_matches_running(&controller);

    settle(&mut controller).await;
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(api.status_calls(), 2);
    assert_eq!(controller.pollers_started(), 1);

    let record = record.lock().unwrap();
    let completions: Vec<_> = record
        .notified
        .iter()
        .filter(|n| n.text.starts_with("Crawl completed"))
        .collect();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].severity, Severity::Success);
    assert_eq!(
        record.notified_with(Severity::Success),
        vec![
            "Crawl started successfully".to_string(),
            "Crawl completed: done".to_string()
        ]
    );
    // Statistics reload after completion.
    assert_eq!(controller.view().total_items, Some(7));
    let last = record.views.last().expect("rendered");
    assert_eq!(last.phase, JobPhase::Idle);
    assert!(last.start_enabled);
}

#[tokio::test(start_paused = true)]
async fn rejected_start_returns_to_idle_with_error() {
    init_logging();
    let api = Arc::new(FakeApi::new().with_start(Err(StartError {
        kind: FailureKind::HttpStatus(400),
        reason: "bad target".to_string(),
    })));
    let (mut controller, sink) = controller_with(api.clone());

    controller.dispatch(Msg::StartClicked { target_count: 1000 });
    assert!(controller.step().await);

    assert_eq!(controller.phase(), JobPhase::Idle);
    assert!(!controller.poller_active());
    assert_eq!(controller.pollers_started(), 0);

    let record = sink.record();
    let record = record.lock().unwrap();
    assert_eq!(record.notified.len(), 1);
    assert_eq!(record.notified[0].severity, Severity::Error);
    assert!(record.notified[0].text.contains("bad target"));
    assert_eq!(controller.notifications().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_during_outstanding_start_stays_idle() {
    init_logging();
    let api = Arc::new(
        FakeApi::new()
            .with_start(Ok(StartAccepted::default()))
            .with_start_delay(Duration::from_secs(1))
            .with_statuses(vec![Ok(status(true, 10, "should not be polled"))]),
    );
    let (mut controller, sink) = controller_with(api.clone());

    controller.dispatch(Msg::StartClicked { target_count: 1000 });
    controller.dispatch(Msg::StopClicked);
    assert_eq!(controller.phase(), JobPhase::Idle);

    // The start answer arrives after the stop.
    assert!(controller.step().await);
    assert_eq!(api.start_calls(), 1);
    assert_eq!(controller.phase(), JobPhase::Idle);
    assert!(!controller.state().is_running);
    assert!(!controller.poller_active());
    assert_eq!(controller.pollers_started(), 0);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(api.status_calls(), 0);
    assert_eq!(api.stop_calls(), 0);

    let record = sink.record();
    let record = record.lock().unwrap();
    assert_eq!(record.notified_with(Severity::Warning), vec!["Crawl stopped".to_string()]);
    assert!(record.notified_with(Severity::Success).is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_while_running_goes_idle_even_when_remote_fails() {
    init_logging();
    let api = Arc::new(
        FakeApi::new()
            .with_start(Ok(StartAccepted::default()))
            .with_failing_stop(),
    );
    let (mut controller, sink) = controller_with(api.clone());

    controller.dispatch(Msg::StartClicked { target_count: 10 });
    assert!(controller.step().await);
    assert_eq!(controller.phase(), JobPhase::Running);

    controller.dispatch(Msg::StopClicked);
    assert_eq!(controller.phase(), JobPhase::Idle);
    assert!(!controller.state().is_running);
    assert!(!controller.poller_active());
    assert!(controller.view().start_enabled);

    settle(&mut controller).await;
    assert_eq!(api.stop_calls(), 1);
    assert_eq!(controller.phase(), JobPhase::Idle);

    let record = sink.record();
    let record = record.lock().unwrap();
    assert_eq!(record.notified_with(Severity::Warning), vec!["Crawl stopped".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn hanging_remote_stop_does_not_block_restart() {
    init_logging();
    let api = Arc::new(
        FakeApi::new()
            .with_start(Ok(StartAccepted::default()))
            .with_start(Ok(StartAccepted::default()))
            .with_hanging_stop(),
    );
    let (mut controller, _sink) = controller_with(api.clone());

    controller.dispatch(Msg::StartClicked { target_count: 10 });
    assert!(controller.step().await);
    controller.dispatch(Msg::StopClicked);

    tokio::time::sleep(Duration::from_secs(600)).await;
    settle(&mut controller).await;
    assert_eq!(api.stop_calls(), 1);
    assert_eq!(controller.phase(), JobPhase::Idle);
    assert!(controller.view().start_enabled);

    controller.dispatch(Msg::StartClicked { target_count: 20 });
    assert_eq!(controller.phase(), JobPhase::Starting);
    assert!(controller.step().await);
    assert_eq!(controller.phase(), JobPhase::Running);
    assert_eq!(controller.state().target_count, 20);
    assert_eq!(api.start_calls(), 2);
    assert_eq!(controller.pollers_started(), 2);
    assert_polling_matches_running(&controller);
}

#[tokio::test(start_paused = true)]
async fn poller_stays_active_until_terminal_status_is_applied() {
    init_logging();
    let api = Arc::new(
        FakeApi::new()
            .with_start(Ok(StartAccepted::default()))
            .with_statuses(vec![Ok(status(false, 100, "done"))]),
    );
    let (mut controller, _sink) = controller_with(api.clone());

    controller.dispatch(Msg::StartClicked { target_count: 10 });
    assert!(controller.step().await);
    assert_eq!(controller.phase(), JobPhase::Running);

    // The terminal poll lands, but the controller has not dispatched it yet.
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(api.status_calls(), 1);
    assert!(controller.state().is_running);
    assert!(controller.poller_active());
    assert_polling_matches_running(&controller);

    assert!(controller.step().await);
    assert_eq!(controller.phase(), JobPhase::Idle);
    assert!(!controller.poller_active());
    assert_polling_matches_running(&controller);
}

#[tokio::test(start_paused = true)]
async fn duplicate_start_keeps_single_poller() {
    init_logging();
    let api = Arc::new(FakeApi::new().with_start(Ok(StartAccepted::default())));
    let (mut controller, _sink) = controller_with(api.clone());

    controller.dispatch(Msg::StartClicked { target_count: 10 });
    controller.dispatch(Msg::StartClicked { target_count: 10 });
    assert!(controller.step().await);
    controller.dispatch(Msg::StartClicked { target_count: 10 });
    settle(&mut controller).await;

    assert_eq!(api.start_calls(), 1);
    assert_eq!(controller.pollers_started(), 1);
    assert!(controller.poller_active());
}

#[tokio::test(start_paused = true)]
async fn poll_errors_are_swallowed() {
    init_logging();
    let api = Arc::new(
        FakeApi::new()
            .with_start(Ok(StartAccepted::default()))
            .with_statuses(vec![Err(poll_error()), Ok(status(true, 25, "going"))]),
    );
    let (mut controller, sink) = controller_with(api.clone());

    controller.dispatch(Msg::StartClicked { target_count: 10 });
    assert!(controller.step().await);
    assert!(controller.step().await);

    assert_eq!(api.status_calls(), 2);
    assert_eq!(controller.phase(), JobPhase::Running);
    assert_eq!(controller.state().progress, 25);

    let record = sink.record();
    let record = record.lock().unwrap();
    assert!(record.notified_with(Severity::Error).is_empty());
}

#[tokio::test(start_paused = true)]
async fn polling_tracks_running_for_intent_sequences() {
    init_logging();
    let api = Arc::new(FakeApi::new().with_statuses(
        (0..50).map(|i| Ok(status(true, i, "running"))),
    ));
    let (mut controller, _sink) = controller_with(api.clone());

    let intents = [
        Msg::StartClicked { target_count: 5 },
        Msg::StopClicked,
        Msg::StopClicked,
        Msg::StartClicked { target_count: 5 },
        Msg::StartClicked { target_count: 6 },
        Msg::RefreshClicked,
        Msg::StopClicked,
        Msg::StartClicked { target_count: 7 },
        Msg::StartClicked { target_count: 7 },
    ];
    for intent in intents {
        controller.dispatch(intent);
        assert_polling_matches_running(&controller);
        settle(&mut controller).await;
        assert_polling_matches_running(&controller);
        tokio::time::sleep(Duration::from_secs(3)).await;
        settle(&mut controller).await;
        assert_polling_matches_running(&controller);
    }

    assert_eq!(controller.phase(), JobPhase::Running);
    assert_eq!(controller.pollers_started(), 3);
}

#[tokio::test(start_paused = true)]
async fn refresh_loads_sample() {
    init_logging();
    let api = Arc::new(FakeApi::new());
    let (mut controller, sink) = controller_with(api.clone());

    controller.dispatch(Msg::RefreshClicked);
    assert!(controller.step().await);

    assert_eq!(controller.view().sample.as_deref(), Some("[5]"));
    let record = sink.record();
    let record = record.lock().unwrap();
    assert_eq!(
        record.notified_with(Severity::Success),
        vec!["Sample data refreshed".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn run_loop_expires_notifications_independently() {
    init_logging();
    let api = Arc::new(FakeApi::new());
    let (controller, sink) = controller_with(api.clone());
    let handle = controller.handle();
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(controller.run(shutdown.clone()));

    // Zero targets are refused locally, each with its own error notification.
    assert!(handle.start(0));
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(handle.start(0));

    tokio::time::sleep(Duration::from_secs(3)).await;
    {
        let record = sink.record();
        let record = record.lock().unwrap();
        assert_eq!(record.notified.len(), 2);
        assert_eq!(record.expired.len(), 1);
        assert_eq!(record.expired[0].id, record.notified[0].id);
        // Boot renders, and statistics arrive.
        assert_eq!(record.views.last().and_then(|v| v.total_items), Some(7));
    }

    tokio::time::sleep(Duration::from_secs(3)).await;
    {
        let record = sink.record();
        let record = record.lock().unwrap();
        assert_eq!(record.expired.len(), 2);
        assert_eq!(record.expired[1].id, record.notified[1].id);
    }

    shutdown.cancel();
    task.await.expect("controller task");
    assert!(!handle.stop());
}
