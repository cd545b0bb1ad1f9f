//! Crawl control core: pure job state machine, notifications and view-model helpers.
mod effect;
mod msg;
mod notify;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use notify::{Notification, NotificationId, NotificationQueue, Severity, NOTIFICATION_TTL};
pub use state::{AppState, CrawlJobState, JobPhase, RemoteStatus, RunId, DEFAULT_TARGET_COUNT};
pub use update::update;
pub use view_model::{JobView, StatusBadge};
