//! `crawlctl.ron` configuration.
//!
//! Every field has a default, so a partial file only overrides what it names.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use crawl_core::DEFAULT_TARGET_COUNT;
use crawl_engine::{ApiSettings, ControllerSettings, DEFAULT_SAMPLE_LIMIT};
use crawl_logging::{LogDestination, DEFAULT_LOG_FILE};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "crawlctl.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Log file only; keeps the terminal for the job display.
    #[default]
    File,
    Terminal,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub notification_ttl_ms: u64,
    pub sample_limit: usize,
    pub default_target_count: u32,
    pub log: LogTarget,
    pub log_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let api = ApiSettings::default();
        let controller = ControllerSettings::default();
        Self {
            base_url: api.base_url,
            poll_interval_ms: millis(controller.poll_interval),
            connect_timeout_ms: millis(api.connect_timeout),
            request_timeout_ms: millis(api.request_timeout),
            notification_ttl_ms: millis(controller.notification_ttl),
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            default_target_count: DEFAULT_TARGET_COUNT,
            log: LogTarget::default(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl ClientConfig {
    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            // A zero period would spin the poller.
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            notification_ttl: Duration::from_millis(self.notification_ttl_ms),
            sample_limit: self.sample_limit,
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match self.log {
            LogTarget::File => LogDestination::File(self.log_file.clone()),
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both(self.log_file.clone()),
        }
    }
}

/// Reads the config file. `Ok(None)` means there is no file at `path`.
pub fn load_config(path: &Path) -> anyhow::Result<Option<ClientConfig>> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("reading config from {}", path.display()))
        }
    };
    let config = ron::from_str(&content)
        .with_context(|| format!("parsing config from {}", path.display()))?;
    Ok(Some(config))
}

pub fn save_config(path: &Path, config: &ClientConfig) -> anyhow::Result<()> {
    let pretty = ron::ser::PrettyConfig::new();
    let content =
        ron::ser::to_string_pretty(config, pretty).context("serializing config")?;
    fs::write(path, content).with_context(|| format!("writing config to {}", path.display()))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
