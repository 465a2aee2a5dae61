//! Docker Engine API over a unix socket.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::trace;

#[derive(Debug, Error)]
pub enum ContainerApiError {
    #[error("cannot reach {path}: {source}")]
    Connect {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("request {0} failed: {1}")]
    Io(String, #[source] std::io::Error),

    #[error("request {0} timed out")]
    Timeout(String),

    #[error("request {path} returned HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("malformed response to {0}")]
    Malformed(String),

    #[error("cannot decode response to {0}: {1}")]
    Decode(String, #[source] serde_json::Error),
}

/// Entry of `GET /containers/json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Container {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Names", default)]
    pub names: Vec<String>,
    #[serde(rename = "Image", default)]
    pub image: String,
    #[serde(rename = "ImageID", default)]
    pub image_id: String,
    #[serde(rename = "State", default)]
    pub state: String,
    #[serde(rename = "Status", default)]
    pub status: String,
}

impl Container {
    /// `web, web-alias@container (nginx:1.27)`
    pub fn display_name(&self) -> String {
        let names: Vec<&str> = self
            .names
            .iter()
            .map(|name| name.trim_start_matches('/'))
            .collect();
        format!("{}@container ({})", names.join(", "), self.image)
    }

    /// Key identifying the container across re-creations.
    pub fn stable_key(&self) -> String {
        match self.names.first() {
            Some(name) => name.trim_start_matches('/').to_string(),
            None => self.id.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == "running"
    }
}

/// Subset of `GET /containers/{id}/json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContainerInspect {
    #[serde(rename = "RestartCount", default)]
    pub restart_count: u64,
}

/// Read access to a container runtime.
#[async_trait]
pub trait ContainerApi: Send + Sync {
    /// Containers of every state.
    async fn list(&self) -> Result<Vec<Container>, ContainerApiError>;

    async fn inspect(&self, id: &str) -> Result<ContainerInspect, ContainerApiError>;
}

/// Minimal HTTP/1.0 client for the Docker socket.
pub struct DockerClient {
    socket: PathBuf,
    timeout: Duration,
}

impl DockerClient {
    pub fn new(socket: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            socket: socket.into(),
            timeout,
        }
    }

    /// GET `path` and decode its JSON body.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ContainerApiError> {
        let response = tokio::time::timeout(self.timeout, self.roundtrip(path))
            .await
            .map_err(|_| ContainerApiError::Timeout(path.to_string()))??;
        let (status, body) =
            parse_response(&response).ok_or_else(|| ContainerApiError::Malformed(path.to_string()))?;
        trace!("GET {} -> {}", path, status);
        if status != 200 {
            return Err(ContainerApiError::Status {
                path: path.to_string(),
                status,
            });
        }
        serde_json::from_slice(body).map_err(|e| ContainerApiError::Decode(path.to_string(), e))
    }

    async fn roundtrip(&self, path: &str) -> Result<Vec<u8>, ContainerApiError> {
        let io_error = |e| ContainerApiError::Io(path.to_string(), e);
        let mut stream = UnixStream::connect(&self.socket)
            .await
            .map_err(|source| ContainerApiError::Connect {
                path: self.socket.display().to_string(),
                source,
            })?;

        let request = format!("GET {} HTTP/1.0\r\nHost: localhost\r\n\r\n", path);
        stream.write_all(request.as_bytes()).await.map_err(io_error)?;
        stream.shutdown().await.map_err(io_error)?;

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.map_err(io_error)?;
        Ok(response)
    }
}

#[async_trait]
impl ContainerApi for DockerClient {
    async fn list(&self) -> Result<Vec<Container>, ContainerApiError> {
        self.get("/containers/json?all=true").await
    }

    async fn inspect(&self, id: &str) -> Result<ContainerInspect, ContainerApiError> {
        self.get(&format!("/containers/{}/json", id)).await
    }
}

/// Split an HTTP/1.x response into status code and body.
fn parse_response(response: &[u8]) -> Option<(u16, &[u8])> {
    let header_end = response.windows(4).position(|w| w == b"\r\n\r\n")?;
    let head = std::str::from_utf8(&response[..header_end]).ok()?;
    let status = head.lines().next()?.split_whitespace().nth(1)?.parse().ok()?;
    Some((status, &response[header_end + 4..]))
}
