mod agent;
mod commands;
mod config;
mod connectivity;
mod generator;
mod models;
mod provisioner;
mod storage;
mod types;

use std::io::stderr;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use crate::config::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(parse_log_level(&cli.log_level));

    let result = match cli.command {
        Command::Provision(args) => commands::provision(args).await,
        Command::Check(args) => commands::check(args).await,
        Command::Generate(args) => commands::generate(args).await,
        Command::Insights(args) => commands::insights(args).await,
        Command::Demo(args) => commands::demo(args).await
    };

    if let Err(failure) = &result {
        error!("{failure:#}");
    }

    result
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'info'", level);
            LevelFilter::INFO
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: stdout carries metrics, reports and summaries, so logs go to stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}
