use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{ClientConfig, LogTarget, DEFAULT_CONFIG_FILE};

#[derive(Debug, Parser)]
#[command(
    name = "crawlctl",
    version,
    about = "Start, monitor and stop a remote crawl job"
)]
pub struct Cli {
    /// Path to a RON config file
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
    /// Control API base URL, overrides the config file
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,
    /// Start a crawl with this target count right away
    #[arg(long, value_name = "COUNT")]
    pub target: Option<u32>,
    /// Where log output goes
    #[arg(long, value_enum)]
    pub log: Option<LogTarget>,
    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
    /// Write the effective config to the config path and exit
    #[arg(long)]
    pub write_config: bool,
}

impl Cli {
    pub fn apply(&self, config: &mut ClientConfig) {
        if let Some(base_url) = &self.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(log) = self.log {
            config.log = log;
        }
    }
}

/// One line typed at the interactive prompt.
#[derive(Debug, Parser)]
#[command(
    no_binary_name = true,
    disable_help_flag = true,
    disable_help_subcommand = true
)]
struct PromptLine {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Start a crawl, optionally with a target count
    Start { target: Option<u32> },
    /// Stop tracking the running crawl
    Stop,
    /// Reload the sample records
    Refresh,
    /// Print the current job state
    Status,
    /// List commands
    Help,
    /// Leave crawlctl
    #[command(alias = "exit")]
    Quit,
}

/// Parses a prompt line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(None);
    }
    PromptLine::try_parse_from(tokens)
        .map(|parsed| Some(parsed.command))
        .map_err(|err| err.to_string())
}
