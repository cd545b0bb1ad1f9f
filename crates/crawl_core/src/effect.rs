use crate::{RunId, Severity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RequestStart { run: RunId, target_count: u32 },
    StartPolling { run: RunId },
    StopPolling,
    StopJob { run: RunId },
    LoadStatistics,
    LoadSample,
    Notify { text: String, severity: Severity },
}

impl Effect {
    pub(crate) fn notify(severity: Severity, text: impl Into<String>) -> Self {
        Effect::Notify {
            text: text.into(),
            severity,
        }
    }
}
