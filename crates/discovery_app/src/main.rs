mod cli;
mod config;
mod logging;
mod persistence;
mod render;
mod run;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use discovery_logging::discovery_info;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let command = Cli::parse().into_command();

    let config = AppConfig::load()?;
    logging::initialize(config.log_destination, config.log_level());
    discovery_info!("discovery_app starting against {}", config.base_url);

    match command {
        Command::Search(args) => run::search(&config, args).await,
        Command::Last => run::last(&config),
    }
}
