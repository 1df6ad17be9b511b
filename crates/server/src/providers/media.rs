//! Media staging HTTP client.
//!
//! Talks to the media service that copies client-supplied audio into
//! storage the transcription provider can read. The staged reference it
//! returns is a pre-authorized URL, so no further credentials travel
//! with the job.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::providers::{MediaStore, StageError};

#[derive(Debug, Serialize)]
struct StageRequest<'a> {
    source: &'a str,
}

#[derive(Debug, Deserialize)]
struct StageResponse {
    url: String,
}

/// HTTP client for the media staging service.
#[derive(Clone)]
pub struct HttpMediaStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMediaStore {
    /// Create a new media staging client.
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MediaStore for HttpMediaStore {
    async fn stage(&self, source_ref: &str) -> Result<String, StageError> {
        let response = self
            .client
            .post(format!("{}/objects", self.base_url))
            .json(&StageRequest { source: source_ref })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StageError::Rejected(format!(
                "staging returned {}: {}",
                status, body
            )));
        }

        let staged: StageResponse = response.json().await?;
        if staged.url.is_empty() {
            return Err(StageError::Malformed(
                "staging response carried no url".to_string(),
            ));
        }

        Ok(staged.url)
    }
}
