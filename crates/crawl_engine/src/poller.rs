use std::sync::Arc;
use std::time::Duration;

use crawl_core::RemoteStatus;
use crawl_logging::{crawl_debug, crawl_info, crawl_warn};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::ControlApi;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Polls the remote status on a fixed cadence while active.
///
/// At most one fetch is in flight: ticks that fall due while a fetch is
/// outstanding are skipped. No fetch follows the first status that reports the
/// job as no longer running, but the poller reports itself active until
/// [`StatusPoller::stop`] is called, so activity never ends before the owner has
/// seen that status.
pub struct StatusPoller {
    api: Arc<dyn ControlApi>,
    interval: Duration,
    active: Option<ActivePoll>,
    instances_started: u64,
}

struct ActivePoll {
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

impl StatusPoller {
    pub fn new(api: Arc<dyn ControlApi>, interval: Duration) -> Self {
        Self {
            api,
            interval,
            active: None,
            instances_started: 0,
        }
    }

    /// Starts polling. Returns `false` without doing anything if already active.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(&mut self, on_update: F) -> bool
    where
        F: Fn(RemoteStatus) + Send + 'static,
    {
        if self.is_active() {
            crawl_debug!("status poller already active; start ignored");
            return false;
        }

        let cancel = CancellationToken::new();
        self.instances_started += 1;
        crawl_info!(
            "status poller #{} started, interval {:?}",
            self.instances_started,
            self.interval
        );

        let task = tokio::spawn(poll_loop(
            self.api.clone(),
            self.interval,
            cancel.clone(),
            on_update,
        ));
        self.active = Some(ActivePoll {
            cancel,
            _task: task,
        });
        true
    }

    /// Cancels the schedule. Returns whether an active poll was stopped.
    pub fn stop(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        active.cancel.cancel();
        crawl_info!("status poller stopped");
        true
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Number of poll instances created over the poller's lifetime.
    pub fn instances_started(&self) -> u64 {
        self.instances_started
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop<F>(
    api: Arc<dyn ControlApi>,
    period: Duration,
    cancel: CancellationToken,
    on_update: F,
) where
    F: Fn(RemoteStatus) + Send + 'static,
{
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut tick: u64 = 0;

    loop {
        let due = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            due = ticker.tick() => due,
        };
        tick += 1;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = api.fetch_status() => result,
        };
        if due.elapsed() >= period {
            // Ticks that fell due during a slow fetch are dropped, not replayed.
            crawl_debug!("poll tick {} overran the interval; next tick rescheduled", tick);
            ticker.reset();
        }

        match result {
            Ok(status) => {
                let finished = !status.is_running;
                crawl_debug!(
                    "poll tick {}: running={} progress={}",
                    tick,
                    status.is_running,
                    status.progress
                );
                on_update(status);
                if finished {
                    // Stays active until the owner has applied the status and calls stop().
                    crawl_info!("remote crawl finished; no further polls after {} ticks", tick);
                    return;
                }
            }
            Err(err) => crawl_warn!("poll tick {} failed: {}", tick, err),
        }
    }
}
