#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use crawl_core::{JobView, Notification, RemoteStatus, Severity};
use crawl_engine::{
    ApiError, ControlApi, FailureKind, PollError, RenderSink, StartAccepted, StartError,
    Statistics,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(crawl_logging::initialize_for_tests);
}

pub fn status(is_running: bool, progress: u8, message: &str) -> RemoteStatus {
    RemoteStatus {
        is_running,
        progress,
        message: message.to_string(),
    }
}

pub fn poll_error() -> PollError {
    PollError(ApiError {
        kind: FailureKind::Network,
        message: "connection reset".to_string(),
    })
}

/// Scripted control API. Unscripted status polls fail with a network error.
#[derive(Default)]
pub struct FakeApi {
    start_results: Mutex<VecDeque<Result<StartAccepted, StartError>>>,
    statuses: Mutex<VecDeque<Result<RemoteStatus, PollError>>>,
    start_delay: Duration,
    fetch_delay: Duration,
    stop_fails: bool,
    stop_hangs: bool,
    pub start_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub sample_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start(self, result: Result<StartAccepted, StartError>) -> Self {
        self.start_results.lock().unwrap().push_back(result);
        self
    }

    pub fn with_statuses(
        self,
        statuses: impl IntoIterator<Item = Result<RemoteStatus, PollError>>,
    ) -> Self {
        self.statuses.lock().unwrap().extend(statuses);
        self
    }

    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    pub fn with_failing_stop(mut self) -> Self {
        self.stop_fails = true;
        self
    }

    /// `stop_job` never resolves.
    pub fn with_hanging_stop(mut self) -> Self {
        self.stop_hangs = true;
        self
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ControlApi for FakeApi {
    async fn start_job(&self, _target_count: u32) -> Result<StartAccepted, StartError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if !self.start_delay.is_zero() {
            tokio::time::sleep(self.start_delay).await;
        }
        self.start_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(StartAccepted::default()))
    }

    async fn stop_job(&self) -> Result<(), ApiError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.stop_hangs {
            std::future::pending::<()>().await;
        }
        if self.stop_fails {
            return Err(ApiError {
                kind: FailureKind::Network,
                message: "unreachable".to_string(),
            });
        }
        Ok(())
    }

    async fn fetch_status(&self) -> Result<RemoteStatus, PollError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(poll_error()))
    }

    async fn fetch_statistics(&self) -> Result<Statistics, ApiError> {
        Ok(Statistics {
            total_items: 7,
            ..Statistics::default()
        })
    }

    async fn fetch_sample(&self, limit: usize) -> Result<String, ApiError> {
        self.sample_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("[{limit}]"))
    }
}

#[derive(Debug, Default)]
pub struct Recorded {
    pub views: Vec<JobView>,
    pub notified: Vec<Notification>,
    pub expired: Vec<Notification>,
}

impl Recorded {
    pub fn notified_with(&self, severity: Severity) -> Vec<String> {
        self.notified
            .iter()
            .filter(|n| n.severity == severity)
            .map(|n| n.text.clone())
            .collect()
    }
}

#[derive(Default, Clone)]
pub struct RecordingSink {
    record: Arc<Mutex<Recorded>>,
}

impl RecordingSink {
    pub fn record(&self) -> Arc<Mutex<Recorded>> {
        self.record.clone()
    }
}

impl RenderSink for RecordingSink {
    fn render(&mut self, view: &JobView) {
        self.record.lock().unwrap().views.push(view.clone());
    }

    fn notify(&mut self, notification: &Notification) {
        self.record
            .lock()
            .unwrap()
            .notified
            .push(notification.clone());
    }

    fn expire(&mut self, notification: &Notification) {
        self.record
            .lock()
            .unwrap()
            .expired
            .push(notification.clone());
    }
}
