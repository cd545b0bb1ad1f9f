use std::sync::Arc;
use std::time::Duration;

use crawl_core::{
    update, AppState, CrawlJobState, Effect, JobPhase, JobView, Msg, Notification,
    NotificationQueue, NOTIFICATION_TTL,
};
use crawl_logging::{crawl_debug, crawl_info, crawl_warn};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::poller::DEFAULT_POLL_INTERVAL;
use crate::{ControlApi, StatusPoller};

pub const DEFAULT_SAMPLE_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub poll_interval: Duration,
    pub notification_ttl: Duration,
    pub sample_limit: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            notification_ttl: NOTIFICATION_TTL,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
        }
    }
}

/// Presentation collaborator driven by the controller.
pub trait RenderSink: Send {
    fn render(&mut self, view: &JobView);

    fn notify(&mut self, notification: &Notification);

    /// Called once a notification's display lifetime is over.
    fn expire(&mut self, _notification: &Notification) {}
}

/// Cloneable intent sender for the user-facing side.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    msg_tx: mpsc::UnboundedSender<Msg>,
}

impl ControllerHandle {
    pub fn start(&self, target_count: u32) -> bool {
        self.send(Msg::StartClicked { target_count })
    }

    pub fn stop(&self) -> bool {
        self.send(Msg::StopClicked)
    }

    pub fn refresh(&self) -> bool {
        self.send(Msg::RefreshClicked)
    }

    /// Returns `false` once the controller is gone.
    pub fn send(&self, msg: Msg) -> bool {
        self.msg_tx.send(msg).is_ok()
    }
}

/// Owns the job state and executes the effects `update` asks for.
///
/// All state changes go through [`JobController::dispatch`]; network calls run
/// as spawned tasks and report back through the message channel, so nothing
/// here blocks on the remote.
pub struct JobController {
    state: AppState,
    api: Arc<dyn ControlApi>,
    poller: StatusPoller,
    notifications: NotificationQueue,
    sink: Box<dyn RenderSink>,
    sample_limit: usize,
    msg_tx: mpsc::UnboundedSender<Msg>,
    msg_rx: mpsc::UnboundedReceiver<Msg>,
}

impl JobController {
    pub fn new(
        api: Arc<dyn ControlApi>,
        settings: ControllerSettings,
        sink: Box<dyn RenderSink>,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::new(),
            poller: StatusPoller::new(api.clone(), settings.poll_interval),
            api,
            notifications: NotificationQueue::new(settings.notification_ttl),
            sink,
            sample_limit: settings.sample_limit,
            msg_tx,
            msg_rx,
        }
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            msg_tx: self.msg_tx.clone(),
        }
    }

    pub fn state(&self) -> &CrawlJobState {
        self.state.job()
    }

    pub fn phase(&self) -> JobPhase {
        self.state.phase()
    }

    pub fn view(&self) -> JobView {
        self.state.view()
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn poller_active(&self) -> bool {
        self.poller.is_active()
    }

    pub fn pollers_started(&self) -> u64 {
        self.poller.instances_started()
    }

    /// Renders the initial view and loads statistics once.
    pub fn boot(&mut self) {
        self.sink.render(&self.state.view());
        self.run_effects(vec![Effect::LoadStatistics]);
    }

    /// Applies one message and executes the resulting effects.
    pub fn dispatch(&mut self, msg: Msg) {
        crawl_debug!("dispatch {:?}", msg);
        let before = self.state.phase();
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;

        let after = self.state.phase();
        if before != after {
            crawl_info!("crawl phase {:?} -> {:?}", before, after);
        }

        self.run_effects(effects);
        self.prune_notifications();

        let view = self.state.view();
        if self.state.consume_dirty() {
            self.sink.render(&view);
        }
    }

    /// Waits for the next message and dispatches it. Returns `false` if the channel closed.
    pub async fn step(&mut self) -> bool {
        match self.msg_rx.recv().await {
            Some(msg) => {
                self.dispatch(msg);
                true
            }
            None => false,
        }
    }

    /// Dispatches every message already queued without waiting.
    pub fn drain_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.dispatch(msg);
            count += 1;
        }
        count
    }

    /// Processes messages and expires notifications until `shutdown` fires.
    pub async fn run(mut self, shutdown: CancellationToken) {
        self.boot();
        loop {
            let next_expiry = self.notifications.next_expiry().map(Instant::from_std);
            tokio::select! {
                _ = shutdown.cancelled() => break,
                msg = self.msg_rx.recv() => match msg {
                    Some(msg) => self.dispatch(msg),
                    None => break,
                },
                _ = sleep_until(next_expiry) => self.prune_notifications(),
            }
        }
        self.poller.stop();
        crawl_info!("job controller shut down in phase {:?}", self.state.phase());
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::RequestStart { run, target_count } => {
                    crawl_info!("start requested run={} target_count={}", run, target_count);
                    let api = self.api.clone();
                    let msg_tx = self.msg_tx.clone();
                    tokio::spawn(async move {
                        let result = match api.start_job(target_count).await {
                            Ok(accepted) => {
                                crawl_debug!("start run={} accepted: {:?}", run, accepted.message);
                                Ok(())
                            }
                            Err(err) => {
                                crawl_warn!("start run={} failed ({}): {}", run, err.kind, err);
                                Err(err.reason)
                            }
                        };
                        let _ = msg_tx.send(Msg::StartCompleted { run, result });
                    });
                }
                Effect::StartPolling { run } => {
                    let msg_tx = self.msg_tx.clone();
                    self.poller.start(move |status| {
                        let _ = msg_tx.send(Msg::StatusReceived { run, status });
                    });
                }
                Effect::StopPolling => {
                    self.poller.stop();
                }
                Effect::StopJob { run } => {
                    let api = self.api.clone();
                    tokio::spawn(async move {
                        match api.stop_job().await {
                            Ok(()) => crawl_debug!("stop run={} settled", run),
                            Err(err) => {
                                crawl_warn!("stop run={} not confirmed by remote: {}", run, err)
                            }
                        }
                    });
                }
                Effect::LoadStatistics => {
                    let api = self.api.clone();
                    let msg_tx = self.msg_tx.clone();
                    tokio::spawn(async move {
                        match api.fetch_statistics().await {
                            Ok(stats) => {
                                let _ = msg_tx.send(Msg::StatisticsLoaded {
                                    total_items: stats.total_items,
                                });
                            }
                            Err(err) => crawl_warn!("statistics unavailable: {}", err),
                        }
                    });
                }
                Effect::LoadSample => {
                    let api = self.api.clone();
                    let msg_tx = self.msg_tx.clone();
                    let limit = self.sample_limit;
                    tokio::spawn(async move {
                        let result = api.fetch_sample(limit).await.map_err(|err| {
                            crawl_warn!("sample refresh failed: {}", err);
                            err.to_string()
                        });
                        let _ = msg_tx.send(Msg::SampleLoaded(result));
                    });
                }
                Effect::Notify { text, severity } => {
                    let now = Instant::now().into_std();
                    let notification = self.notifications.push_at(text, severity, now);
                    self.sink.notify(notification);
                }
            }
        }
    }

    fn prune_notifications(&mut self) {
        let now = Instant::now().into_std();
        for notification in self.notifications.prune(now) {
            self.sink.expire(&notification);
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
