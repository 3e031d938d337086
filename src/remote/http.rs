//! HTTP key-value bucket backed by reqwest

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::Value;
use std::future::Future;
use tracing::debug;

use super::RemoteBucket;
use crate::core::SyncConfig;
use crate::error::{Result, StoreError};

const JSON_CONTENT_TYPE: &str = "application/json";
const USER_AGENT: &str = concat!("kvsync/", env!("CARGO_PKG_VERSION"));

/// Bucket reachable at `{base_url}/{bucket}/{prefix}{key}`
///
/// `GET` returns the document (404 when absent); `POST` replaces it.
pub struct HttpBucket {
    client: reqwest::Client,
    config: SyncConfig,
}

impl HttpBucket {
    pub fn new(config: SyncConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Runs a request with the configured timeout
    async fn bounded<F, T>(&self, key: &str, request: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, reqwest::Error>>,
    {
        let timeout_duration = self.config.request_timeout;

        match tokio::time::timeout(timeout_duration, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(StoreError::NetworkFailure {
                key: key.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(StoreError::NetworkFailure {
                key: key.to_string(),
                reason: format!("request timed out after {:?}", timeout_duration),
            }),
        }
    }
}

#[async_trait]
impl RemoteBucket for HttpBucket {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, key: &str) -> Result<Option<Value>> {
        let url = self.config.document_url(key);
        debug!(%url, "GET");

        let (status, body) = self
            .bounded(key, async {
                let response = self.client.get(&url).send().await?;
                let status = response.status();
                let body = response.bytes().await?;
                Ok::<_, reqwest::Error>((status, body))
            })
            .await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::RemoteReadFailed {
                key: key.to_string(),
                status: status.as_u16(),
            });
        }
        // Some services answer an unset key with an empty 200
        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(None);
        }

        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|source| StoreError::DeserializationFailure {
                key: key.to_string(),
                source,
            })
    }

    async fn replace(&self, key: &str, document: &Value) -> Result<()> {
        let url = self.config.document_url(key);
        let body = serde_json::to_vec(document).map_err(|source| {
            StoreError::SerializationFailure {
                key: key.to_string(),
                source,
            }
        })?;
        debug!(%url, bytes = body.len(), "POST");

        let status = self
            .bounded(key, async {
                let response = self
                    .client
                    .post(&url)
                    .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
                    .body(body)
                    .send()
                    .await?;
                Ok::<_, reqwest::Error>(response.status())
            })
            .await?;

        if !status.is_success() {
            return Err(StoreError::RemoteWriteRejected {
                key: key.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
