//! Crawl engine: control API transport, status polling and effect execution.
mod api;
mod controller;
mod poller;
mod types;

pub use api::{parse_base_url, ApiSettings, ControlApi, ReqwestControlApi};
pub use controller::{
    ControllerHandle, ControllerSettings, JobController, RenderSink, DEFAULT_SAMPLE_LIMIT,
};
pub use poller::{StatusPoller, DEFAULT_POLL_INTERVAL};
pub use types::{
    ApiError, FailureKind, PollError, StartAccepted, StartError, Statistics, NETWORK_REASON,
    UNKNOWN_REASON,
};
