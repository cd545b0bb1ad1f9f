mod cli;
mod config;
mod console;

use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use crawl_engine::{JobController, ReqwestControlApi};
use crawl_logging::{crawl_info, crawl_warn};
use log::LevelFilter;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Command};
use crate::config::ClientConfig;
use crate::console::LastView;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, load_error) = match config::load_config(&cli.config) {
        Ok(Some(config)) => (config, None),
        Ok(None) => (ClientConfig::default(), None),
        Err(err) => (ClientConfig::default(), Some(err)),
    };
    cli.apply(&mut config);

    if cli.write_config {
        config::save_config(&cli.config, &config)?;
        println!("Wrote {}", cli.config.display());
        return Ok(());
    }

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    crawl_logging::initialize(config.log_destination(), level);
    if let Some(err) = load_error {
        crawl_warn!("Using default config: {:#}", err);
    }

    // One thread: intents, polling and rendering interleave cooperatively.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    runtime.block_on(run(config, cli.target))
}

async fn run(config: ClientConfig, auto_start: Option<u32>) -> anyhow::Result<()> {
    let api = ReqwestControlApi::new(config.api_settings()).context("building control API client")?;
    crawl_info!("Control API at {}", api.base_url());

    let last_view: LastView = Arc::new(Mutex::new(None));
    let sink = console::ConsoleSink::new(last_view.clone());
    let controller = JobController::new(
        Arc::new(api),
        config.controller_settings(),
        Box::new(sink),
    );
    let handle = controller.handle();
    let shutdown = CancellationToken::new();
    let controller_task = tokio::spawn(controller.run(shutdown.clone()));

    console::print_help();
    if let Some(target_count) = auto_start {
        handle.start(target_count);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => line.context("reading stdin")?,
        };
        let Some(line) = line else {
            break;
        };

        match cli::parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Start { target })) => {
                handle.start(target.unwrap_or(config.default_target_count));
            }
            Ok(Some(Command::Stop)) => {
                handle.stop();
            }
            Ok(Some(Command::Refresh)) => {
                handle.refresh();
            }
            Ok(Some(Command::Status)) => {
                let view = last_view.lock().ok().and_then(|view| view.clone());
                match view {
                    Some(view) => println!("{}", console::status_line(&view)),
                    None => println!("No status yet"),
                }
            }
            Ok(Some(Command::Help)) => console::print_help(),
            Ok(Some(Command::Quit)) => break,
            Err(message) => println!("{}", message.trim_end()),
        }
    }

    shutdown.cancel();
    controller_task.await.context("joining controller task")?;
    crawl_info!("crawlctl exiting");
    Ok(())
}
