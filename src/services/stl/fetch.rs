use std::future::Future;
use std::time::Duration;

use futures_util::StreamExt;
use log::{info, warn};
use reqwest::{Client, StatusCode};

use super::types::StlError;

/// Where archive bytes come from. Behind a trait so tests can serve archives from memory.
pub trait ArchiveSource: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, StlError>> + Send;
}

/// Downloads archives over HTTP with a deadline and a body size cap. No retries.
#[derive(Debug, Clone)]
pub struct HttpArchiveSource {
    client: Client,
    max_bytes: u64,
}

impl HttpArchiveSource {
    pub fn new(timeout: Duration, max_bytes: u64) -> Result<Self, StlError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StlError::Unexpected(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, max_bytes })
    }
}

impl ArchiveSource for HttpArchiveSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StlError> {
        info!("Fetching archive: {url}");

        let response = self.client.get(url).send().await.map_err(network)?;

        if response.status() != StatusCode::OK {
            warn!("Archive fetch failed for '{url}': HTTP {}", response.status());
            return Err(StlError::UpstreamFetchFailed {
                status: response.status().as_u16(),
            });
        }

        if let Some(declared) = response.content_length() {
            if declared > self.max_bytes {
                return Err(StlError::ArchiveTooLarge(format!(
                    "archive is {declared} bytes, limit is {}",
                    self.max_bytes
                )));
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(network)?;
            if (body.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(StlError::ArchiveTooLarge(format!(
                    "archive exceeds {} bytes",
                    self.max_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }

        info!("Fetched archive: {} bytes", body.len());
        Ok(body)
    }
}

fn network(error: reqwest::Error) -> StlError {
    if error.is_timeout() {
        StlError::Network(format!("timed out: {error}"))
    } else {
        StlError::Network(error.to_string())
    }
}
