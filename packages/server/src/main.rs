#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use clap::Parser;
use reviewer_server::config::{Cli, log_filter};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let (filter, known_mode) = log_filter(&cli.mode);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if !known_mode {
        log::warn!("Unknown MODE '{}', logging at {filter}", cli.mode);
    }

    reviewer_server::run_server(cli.server_config())
        .await
        .map_err(std::io::Error::other)
}
