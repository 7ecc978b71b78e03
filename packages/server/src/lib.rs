#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! HTTP surface for PR Reviewer.
//!
//! Routes decode JSON bodies and query strings into
//! [`reviewer_server_models`] types, delegate to [`reviewer_service`] and
//! render failures as `{"error": {"code", "message"}}`.

pub mod config;
mod error;
mod pull_request;
mod state;
mod team;
mod user;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, middleware, web};
use reviewer_repository::UnitOfWorkFactory;
use reviewer_repository_memory::MemoryStore;
use reviewer_repository_sqlite::{DbError, SqliteStore};
use state::AppState;
use tokio::task::JoinHandle;

pub use error::ApiError;

/// Storage backend the server runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Database {
    Memory,
    Sqlite { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database: Database,
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("0.0.0.0".to_string(), 8080)
    }
}

impl ServerConfig {
    #[must_use]
    pub const fn new(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            database: Database::Memory,
            request_timeout: Duration::from_secs(10),
        }
    }

    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: String) -> Self {
        self.host = host;
        self
    }

    #[must_use]
    pub fn with_database(mut self, database: Database) -> Self {
        self.database = database;
        self
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Open the configured storage backend.
///
/// # Errors
///
/// * If the `SQLite` database cannot be opened or migrated
pub async fn open_store(database: &Database) -> Result<Arc<dyn UnitOfWorkFactory>, ServerError> {
    match database {
        Database::Memory => {
            log::info!("Using in-memory storage");
            Ok(Arc::new(MemoryStore::new()))
        }
        Database::Sqlite { path } => {
            log::info!("Using SQLite storage at {}", path.display());
            Ok(Arc::new(SqliteStore::open(path).await?))
        }
    }
}

/// # Errors
///
/// * If the storage backend cannot be opened
/// * If the server fails to bind or run
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let factory = open_store(&config.database).await?;
    let RunServerResponse { join_handle, .. } = run_server_with_handle(&config, factory)?;

    join_handle.await.map_err(std::io::Error::other)??;

    log::info!("Server stopped");

    Ok(())
}

pub struct RunServerResponse {
    pub handle: actix_web::dev::ServerHandle,
    pub addrs: Vec<std::net::SocketAddr>,
    pub join_handle: JoinHandle<Result<(), std::io::Error>>,
}

/// # Errors
///
/// Returns an error if the server fails to bind
pub fn run_server_with_handle(
    config: &ServerConfig,
    factory: Arc<dyn UnitOfWorkFactory>,
) -> std::io::Result<RunServerResponse> {
    log::info!("Starting PR Reviewer on {}:{}", config.host, config.port);

    let state = web::Data::new(AppState::new(factory, config.request_timeout));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(json_config())
            .app_data(query_config())
            .wrap(middleware::Logger::default())
            .route("/team/add", web::post().to(team::add))
            .route("/team/get", web::get().to(team::get))
            .route("/users/setIsActive", web::post().to(user::set_is_active))
            .route("/users/getReview", web::get().to(user::get_review))
            .route("/pullRequest/create", web::post().to(pull_request::create))
            .route("/pullRequest/merge", web::post().to(pull_request::merge))
            .route("/pullRequest/reassign", web::post().to(pull_request::reassign))
            .route("/health", web::get().to(|| async { "OK" }))
    })
    .bind((config.host.as_str(), config.port))?;

    let addrs = server.addrs();
    let server = server.run();
    let handle = server.handle();

    let join_handle = tokio::spawn(server);

    Ok(RunServerResponse {
        handle,
        addrs,
        join_handle,
    })
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|error, _req| {
        log::debug!("Rejecting request body: {error}");
        ApiError::InvalidRequest("invalid JSON body".to_string()).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|error, _req| {
        log::debug!("Rejecting query string: {error}");
        ApiError::InvalidRequest("invalid query parameters".to_string()).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.database, Database::Memory);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_builders() {
        let config = ServerConfig::default()
            .with_host("127.0.0.1".to_string())
            .with_port(0)
            .with_database(Database::Sqlite {
                path: PathBuf::from("data/reviewer.db"),
            })
            .with_request_timeout(Duration::from_millis(250));

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 0);
        assert_eq!(
            config.database,
            Database::Sqlite {
                path: PathBuf::from("data/reviewer.db")
            }
        );
        assert_eq!(config.request_timeout, Duration::from_millis(250));
    }
}
