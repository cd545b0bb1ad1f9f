use crate::view_model::{JobView, StatusBadge};

/// Identifies one start attempt. Late results tagged with an older run are ignored.
pub type RunId = u64;

/// Goal used when the user does not supply one.
pub const DEFAULT_TARGET_COUNT: u32 = 290_000;

const READY_MESSAGE: &str = "Ready to start";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    /// Start request sent, no answer yet.
    Starting,
    /// Remote accepted the start; the status poller is active.
    Running,
}

/// Status document reported by the remote control API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStatus {
    pub is_running: bool,
    pub progress: u8,
    pub message: String,
}

/// Local view of the remote crawl. Only `update` mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlJobState {
    pub is_running: bool,
    pub progress: u8,
    pub message: String,
    pub target_count: u32,
}

impl Default for CrawlJobState {
    fn default() -> Self {
        Self {
            is_running: false,
            progress: 0,
            message: READY_MESSAGE.to_string(),
            target_count: DEFAULT_TARGET_COUNT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    phase: JobPhase,
    job: CrawlJobState,
    run: RunId,
    total_items: Option<u64>,
    sample: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn job(&self) -> &CrawlJobState {
        &self.job
    }

    /// Run id of the most recent start attempt, 0 before the first one.
    pub fn current_run(&self) -> RunId {
        self.run
    }

    pub fn view(&self) -> JobView {
        let status_badge = if self.job.is_running {
            StatusBadge::Running
        } else if self.job.progress == 100 {
            StatusBadge::Completed
        } else {
            StatusBadge::Idle
        };

        JobView {
            phase: self.phase,
            job: self.job.clone(),
            status_badge,
            start_enabled: self.phase == JobPhase::Idle,
            stop_enabled: matches!(self.phase, JobPhase::Starting | JobPhase::Running),
            total_items: self.total_items,
            sample: self.sample.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn begin_start(&mut self, target_count: u32) -> RunId {
        self.run += 1;
        self.phase = JobPhase::Starting;
        self.job.target_count = target_count;
        self.mark_dirty();
        self.run
    }

    pub(crate) fn mark_running(&mut self) {
        self.phase = JobPhase::Running;
        self.job.is_running = true;
        self.mark_dirty();
    }

    pub(crate) fn mark_idle(&mut self) {
        self.phase = JobPhase::Idle;
        self.job.is_running = false;
        self.mark_dirty();
    }

    pub(crate) fn apply_status(&mut self, status: &RemoteStatus) {
        self.job.progress = status.progress;
        self.job.message.clone_from(&status.message);
        self.mark_dirty();
    }

    pub(crate) fn set_total_items(&mut self, total_items: u64) {
        if self.total_items != Some(total_items) {
            self.total_items = Some(total_items);
            self.mark_dirty();
        }
    }

    pub(crate) fn set_sample(&mut self, sample: String) {
        self.sample = Some(sample);
        self.mark_dirty();
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
