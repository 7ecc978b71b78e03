use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::{Database, ServerConfig};

#[derive(Debug, Clone, Parser)]
#[command(name = "reviewer-server")]
#[command(about = "Assigns pull request reviewers from the author's team", long_about = None)]
pub struct Cli {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// `dev` logs at debug level, `prod` at info.
    #[arg(long, env = "MODE", default_value = "dev")]
    pub mode: String,

    #[arg(long, env = "DATABASE", value_enum, default_value_t = DatabaseKind::Sqlite)]
    pub database: DatabaseKind,

    #[arg(long, env = "DATABASE_PATH", default_value = "pr_reviewer.db")]
    pub database_path: PathBuf,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DatabaseKind {
    Sqlite,
    Memory,
}

impl Cli {
    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        let database = match self.database {
            DatabaseKind::Sqlite => Database::Sqlite {
                path: self.database_path.clone(),
            },
            DatabaseKind::Memory => Database::Memory,
        };

        ServerConfig::new(self.host.clone(), self.port)
            .with_database(database)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
    }
}

/// Default `env_logger` filter for a run mode, and whether the mode was
/// recognized. Unknown modes fall back to `info`.
#[must_use]
pub fn log_filter(mode: &str) -> (&'static str, bool) {
    match mode {
        "dev" => ("debug", true),
        "prod" => ("info", true),
        _ => ("info", false),
    }
}
