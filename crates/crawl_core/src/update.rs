use crate::{AppState, Effect, JobPhase, Msg, RemoteStatus, Severity};

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages that no longer apply (wrong phase, or tagged with an older run)
/// leave the state untouched and produce no effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartClicked { target_count } => {
            if state.phase() != JobPhase::Idle {
                return (state, Vec::new());
            }
            if target_count == 0 {
                return (
                    state,
                    vec![Effect::notify(
                        Severity::Error,
                        "Error: target count must be greater than zero",
                    )],
                );
            }
            let run = state.begin_start(target_count);
            vec![Effect::RequestStart { run, target_count }]
        }
        Msg::StartCompleted { run, result } => {
            if state.phase() != JobPhase::Starting || run != state.current_run() {
                return (state, Vec::new());
            }
            match result {
                Ok(()) => {
                    state.mark_running();
                    vec![
                        Effect::StartPolling { run },
                        Effect::notify(Severity::Success, "Crawl started successfully"),
                    ]
                }
                Err(reason) => {
                    state.mark_idle();
                    vec![Effect::notify(Severity::Error, format!("Error: {reason}"))]
                }
            }
        }
        Msg::StopClicked => match state.phase() {
            JobPhase::Starting => {
                // The start request stays in flight; its answer will carry a stale run.
                state.mark_idle();
                vec![Effect::notify(Severity::Warning, "Crawl stopped")]
            }
            JobPhase::Running => {
                // The remote stop is fire-and-forget; local state never waits on it.
                let run = state.current_run();
                state.mark_idle();
                vec![
                    Effect::StopPolling,
                    Effect::StopJob { run },
                    Effect::notify(Severity::Warning, "Crawl stopped"),
                ]
            }
            JobPhase::Idle => Vec::new(),
        },
        Msg::StatusReceived { run, status } => {
            if state.phase() != JobPhase::Running || run != state.current_run() {
                return (state, Vec::new());
            }
            state.apply_status(&status);
            if status.is_running {
                Vec::new()
            } else {
                state.mark_idle();
                vec![
                    Effect::StopPolling,
                    terminal_notification(&status),
                    Effect::LoadStatistics,
                ]
            }
        }
        Msg::RefreshClicked => vec![Effect::LoadSample],
        Msg::StatisticsLoaded { total_items } => {
            state.set_total_items(total_items);
            Vec::new()
        }
        Msg::SampleLoaded(Ok(sample)) => {
            state.set_sample(sample);
            vec![Effect::notify(Severity::Success, "Sample data refreshed")]
        }
        Msg::SampleLoaded(Err(reason)) => vec![Effect::notify(
            Severity::Error,
            format!("Failed to refresh sample data: {reason}"),
        )],
    };

    (state, effects)
}

fn terminal_notification(status: &RemoteStatus) -> Effect {
    if status.progress == 100 {
        Effect::notify(
            Severity::Success,
            format!("Crawl completed: {}", status.message),
        )
    } else {
        Effect::notify(Severity::Info, format!("Crawl finished: {}", status.message))
    }
}
