#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use fund_tracker::config::AppConfig;
use fund_tracker::state::AppState;

pub const ADMIN_SECRET: &str = "test-secret";

/// In-process server on its own port with a private in-memory store
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
    /// Direct store access for arranging rows the HTTP surface cannot create
    pub state: Arc<AppState>,
    handle: Option<JoinHandle<Result<()>>>,
}

impl TestServer {
    /// Start with the default test configuration and wait for storage to be ready.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(configure: impl FnOnce(&mut AppConfig)) -> Result<Self> {
        let server = Self::start(configure).await?;
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    /// Start without waiting for the bootstrap to settle.
    pub async fn start(configure: impl FnOnce(&mut AppConfig)) -> Result<Self> {
        let mut config = AppConfig::development();
        config.database.url = "sqlite::memory:".to_string();
        config.security.admin_secret = Some(ADMIN_SECRET.to_string());
        config.api.enable_rate_limiting = false;
        config.api.enable_request_logging = false;
        configure(&mut config);

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;

        let state: Arc<AppState> = AppState::new(config)?;
        let handle = tokio::spawn(fund_tracker::server::run(listener, state.clone()));

        Ok(Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
            state,
            handle: Some(handle),
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Wait for the server task to exit on its own and return its outcome.
    pub async fn finish(mut self, timeout: Duration) -> Result<Result<()>> {
        let handle = self.handle.take().context("server already finished")?;
        let joined = tokio::time::timeout(timeout, handle)
            .await
            .context("server did not exit")?;
        Ok(joined?)
    }

    pub async fn fund(&self) -> Result<serde_json::Value> {
        let res = self.client.get(self.url("/api/fund")).send().await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "GET /api/fund returned {}", res.status());
        Ok(res.json().await?)
    }

    pub async fn donate(&self, body: &serde_json::Value) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url("/api/donations"))
            .header("x-admin-secret", ADMIN_SECRET)
            .json(body)
            .send()
            .await?)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
