use crate::{RemoteStatus, RunId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked to start a crawl with the given goal.
    StartClicked { target_count: u32 },
    /// User asked to stop the current crawl.
    StopClicked,
    /// User asked to reload the sample data.
    RefreshClicked,
    /// The start request for `run` resolved. `Err` carries the failure reason.
    StartCompleted {
        run: RunId,
        result: Result<(), String>,
    },
    /// A status poll for `run` returned.
    StatusReceived { run: RunId, status: RemoteStatus },
    /// Statistics endpoint answered.
    StatisticsLoaded { total_items: u64 },
    /// Sample endpoint answered. `Ok` carries pretty-printed records.
    SampleLoaded(Result<String, String>),
}
