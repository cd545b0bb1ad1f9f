//! Terminal presentation: renders job views and notifications to stdout.

use std::sync::{Arc, Mutex};

use chrono::Local;
use crawl_core::{JobPhase, JobView, Notification, Severity, StatusBadge};
use crawl_engine::RenderSink;
use crawl_logging::crawl_debug;

const BAR_WIDTH: usize = 30;

/// Last view rendered, shared with the prompt loop for the `status` command.
pub type LastView = Arc<Mutex<Option<JobView>>>;

pub struct ConsoleSink {
    last_view: LastView,
    last_sample: Option<String>,
}

impl ConsoleSink {
    pub fn new(last_view: LastView) -> Self {
        Self {
            last_view,
            last_sample: None,
        }
    }
}

impl RenderSink for ConsoleSink {
    fn render(&mut self, view: &JobView) {
        println!("[{}] {}", timestamp(), status_line(view));

        if view.sample != self.last_sample {
            if let Some(sample) = &view.sample {
                println!("Sample records:\n{sample}");
            }
            self.last_sample.clone_from(&view.sample);
        }

        if let Ok(mut last) = self.last_view.lock() {
            *last = Some(view.clone());
        }
    }

    fn notify(&mut self, notification: &Notification) {
        println!(
            "[{}] {:<7} {}",
            timestamp(),
            severity_label(notification.severity),
            notification.text
        );
    }

    fn expire(&mut self, notification: &Notification) {
        crawl_debug!("notification #{} expired", notification.id);
    }
}

pub fn status_line(view: &JobView) -> String {
    let phase = match view.phase {
        JobPhase::Idle => "idle",
        JobPhase::Starting => "starting",
        JobPhase::Running => "running",
    };
    let badge = match view.status_badge {
        StatusBadge::Running => "in progress",
        StatusBadge::Completed => "completed",
        StatusBadge::Idle => "not running",
    };
    let mut line = format!(
        "{phase:<8} [{}] {:>3}% {} ({badge}) target {}",
        progress_bar(view.job.progress, BAR_WIDTH),
        view.job.progress,
        view.job.message,
        view.job.target_count,
    );
    if let Some(total) = view.total_items {
        line.push_str(&format!(" | stored items {total}"));
    }
    let actions = match (view.start_enabled, view.stop_enabled) {
        (true, _) => " | start available",
        (false, true) => " | stop available",
        (false, false) => "",
    };
    line.push_str(actions);
    line
}

/// Fixed-width bar; progress above 100 renders as full.
pub fn progress_bar(progress: u8, width: usize) -> String {
    let filled = usize::from(progress.min(100)) * width / 100;
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn print_help() {
    println!("Commands: start [COUNT] | stop | refresh | status | help | quit");
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "info",
        Severity::Success => "ok",
        Severity::Warning => "warning",
        Severity::Error => "error",
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
