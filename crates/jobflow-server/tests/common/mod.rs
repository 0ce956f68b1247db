//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use jobflow_engine::{EngineConfig, EngineServices};
use jobflow_server::{Server, ServerConfig};
use jobflow_store::Store;
use jobflow_store::fixtures::seed_catalog;

/// A test server that runs in the background over a seeded file-backed store.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client configured for this server.
    pub client: Client,
    /// Store shared with the server, for direct assertions.
    pub store: Arc<Store>,
    /// Handle to the server task.
    _handle: JoinHandle<()>,
    /// Temporary directory holding the database file.
    pub temp_dir: TempDir,
}

impl TestServer {
    /// Start a new test server with default configuration.
    pub async fn start() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let store = Arc::new(Store::open(&temp_dir.path().join("jobflow.db"))?);
        seed_catalog(&store);

        let addr = find_available_port().await?;
        let config = ServerConfig::new()
            .with_bind_address(addr)
            .with_request_logging(false);
        let engine = EngineServices::from_store(store.clone(), EngineConfig::default());

        let server = Server::new(engine, config);
        let handle = tokio::spawn(async move {
            let _ = server.run_on(addr).await;
        });

        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            store,
            _handle: handle,
            temp_dir,
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get a GET request builder.
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(format!("{}{}", self.base_url(), path))
    }

    /// Get a POST request builder.
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(format!("{}{}", self.base_url(), path))
    }

    /// Start a job over HTTP and return its id.
    pub async fn start_job(&self, workflow_id: i64) -> Result<i64> {
        let resp = self
            .post("/api/v1/workflow/start")
            .json(&serde_json::json!({ "WorkflowID": workflow_id }))
            .send()
            .await?;
        anyhow::ensure!(resp.status().as_u16() == 201, "start failed: {}", resp.status());
        let body: serde_json::Value = resp.json().await?;
        body["JOB_ID"]
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("missing JOB_ID in {body}"))
    }
}

/// Find an available port for the test server.
async fn find_available_port() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
