use crate::{CrawlJobState, JobPhase};

/// Badge shown next to the status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusBadge {
    Running,
    Completed,
    #[default]
    Idle,
}

/// Snapshot handed to the render collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobView {
    pub phase: JobPhase,
    pub job: CrawlJobState,
    pub status_badge: StatusBadge,
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub total_items: Option<u64>,
    pub sample: Option<String>,
    pub dirty: bool,
}
