use crate::cli::download;
use clap::{CommandFactory, Parser};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod error;

const DEFAULT_LOG_FILTER: &str = "liblecture=debug,lecture_manager=debug";

#[tokio::main]
async fn main() -> ExitCode {
    let config = match cli::Cli::parse().resolve() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{}", cli::Cli::command().render_usage());
            return ExitCode::FAILURE;
        }
    };

    let f_appender = tracing_appender::rolling::hourly(&config.cache_dir, "lecture-manager.log");
    let (non_blk, _guard) = tracing_appender::non_blocking(f_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .event_format(tracing_subscriber::fmt::format().pretty())
        .with_writer(non_blk)
        .init();

    if download(config).await {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
