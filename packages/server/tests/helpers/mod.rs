#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use reviewer_repository::UnitOfWorkFactory;
use reviewer_repository_memory::MemoryStore;
use reviewer_server::{Database, ServerConfig, open_store, run_server_with_handle};
use serde_json::{Value, json};

pub struct TestServer {
    port: u16,
    http_url: String,
    handle: actix_web::dev::ServerHandle,
    client: reqwest::Client,
    _db_dir: Option<tempfile::TempDir>,
}

impl TestServer {
    /// # Errors
    ///
    /// Returns an error if the server fails to start or no ports are available
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(Arc::new(MemoryStore::new()), Duration::from_secs(10), None).await
    }

    /// Start against a fresh `SQLite` database in a temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the server fails to start
    pub async fn start_sqlite() -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let factory = open_store(&Database::Sqlite {
            path: dir.path().join("reviewer.db"),
        })
        .await?;

        Self::start_with(factory, Duration::from_secs(10), Some(dir)).await
    }

    /// # Errors
    ///
    /// Returns an error if the server fails to start or no ports are available
    pub async fn start_with_timeout(request_timeout: Duration) -> anyhow::Result<Self> {
        Self::start_with(Arc::new(MemoryStore::new()), request_timeout, None).await
    }

    async fn start_with(
        factory: Arc<dyn UnitOfWorkFactory>,
        request_timeout: Duration,
        db_dir: Option<tempfile::TempDir>,
    ) -> anyhow::Result<Self> {
        let config = ServerConfig::new("127.0.0.1".to_string(), 0)
            .with_request_timeout(request_timeout);

        let response = run_server_with_handle(&config, factory)?;
        let port = response
            .addrs
            .first()
            .expect("Expected at least one address")
            .port();
        let http_url = format!("http://127.0.0.1:{port}");

        wait_for_server_ready(&http_url).await?;

        Ok(Self {
            port,
            http_url,
            handle: response.handle,
            client: reqwest::Client::new(),
            _db_dir: db_dir,
        })
    }

    #[must_use]
    pub fn http_url(&self) -> &str {
        &self.http_url
    }

    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// POST `body` to `path`, returning the status and decoded JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not JSON
    pub async fn post(&self, path: &str, body: &Value) -> anyhow::Result<(u16, Value)> {
        let response = self
            .client
            .post(format!("{}{path}", self.http_url))
            .json(body)
            .send()
            .await?;
        let status = response.status().as_u16();

        Ok((status, response.json().await?))
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not JSON
    pub async fn get(&self, path_and_query: &str) -> anyhow::Result<(u16, Value)> {
        let response = self
            .client
            .get(format!("{}{path_and_query}", self.http_url))
            .send()
            .await?;
        let status = response.status().as_u16();

        Ok((status, response.json().await?))
    }

    /// Create a team of active members named by `ids`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn add_team(&self, name: &str, ids: &[&str]) -> anyhow::Result<(u16, Value)> {
        let members: Vec<Value> = ids
            .iter()
            .map(|id| json!({"user_id": id, "username": format!("name-{id}"), "is_active": true}))
            .collect();

        self.post("/team/add", &json!({"team_name": name, "members": members}))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn create_pr(&self, id: &str, author: &str) -> anyhow::Result<(u16, Value)> {
        self.post(
            "/pullRequest/create",
            &json!({
                "pull_request_id": id,
                "pull_request_name": format!("Change {id}"),
                "author_id": author,
            }),
        )
        .await
    }

    #[must_use]
    pub const fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let handle = self.handle.clone();
        tokio::spawn(async move {
            handle.stop(true).await;
        });
    }
}

async fn wait_for_server_ready(url: &str) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let health_url = format!("{url}/health");

    for _ in 0..30 {
        if let Ok(response) = client.get(&health_url).send().await
            && response.status().is_success()
        {
            return Ok(());
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }

    anyhow::bail!("Server failed to start within timeout")
}
