//! Batch transcription HTTP client.
//!
//! Speaks the speech-to-text batch REST protocol: starting a
//! transcription returns an operation URL whose last segment is the
//! handle, and a finished operation links to result files whose content
//! holds the recognized phrases.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::providers::{PollStatus, StageError, TranscriptionClient};

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartRequest<'a> {
    content_urls: Vec<&'a str>,
    locale: &'a str,
    display_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    #[serde(rename = "self")]
    self_url: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    properties: Option<StatusProperties>,
    #[serde(default)]
    links: Option<StatusLinks>,
}

#[derive(Debug, Deserialize)]
struct StatusProperties {
    #[serde(default)]
    error: Option<StatusError>,
}

#[derive(Debug, Deserialize)]
struct StatusError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct StatusLinks {
    #[serde(default)]
    files: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    values: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    #[serde(default)]
    links: Option<FileLinks>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileLinks {
    #[serde(default)]
    content_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranscriptContent {
    #[serde(default)]
    combined_recognized_phrases: Vec<RecognizedPhrase>,
}

#[derive(Debug, Deserialize)]
struct RecognizedPhrase {
    #[serde(default)]
    display: String,
}

/// HTTP client for the batch transcription service.
#[derive(Clone)]
pub struct HttpTranscriptionClient {
    client: reqwest::Client,
    base_url: String,
    subscription_key: String,
    locale: String,
}

impl HttpTranscriptionClient {
    /// Create a new transcription client.
    pub fn new(base_url: &str, subscription_key: &str, locale: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            subscription_key: subscription_key.to_string(),
            locale: locale.to_string(),
        }
    }

    /// Fetch the finished transcript behind a succeeded operation: the
    /// status links to a file list, the first file's content URL holds
    /// the recognized phrases. The content URL is pre-authorized.
    async fn fetch_transcript(&self, status: &StatusResponse) -> Result<String, StageError> {
        let files_url = status
            .links
            .as_ref()
            .and_then(|l| l.files.as_deref())
            .ok_or_else(|| {
                StageError::Malformed("succeeded transcription carried no files link".to_string())
            })?;

        let files: FileList = self
            .client
            .get(files_url)
            .header(SUBSCRIPTION_KEY_HEADER, &self.subscription_key)
            .send()
            .await?
            .json()
            .await?;

        let content_url = files
            .values
            .into_iter()
            .find_map(|f| f.links.and_then(|l| l.content_url))
            .ok_or_else(|| {
                StageError::Malformed("transcription file list carried no content url".to_string())
            })?;

        let content: TranscriptContent = self.client.get(content_url).send().await?.json().await?;

        let transcript = content
            .combined_recognized_phrases
            .into_iter()
            .map(|p| p.display)
            .collect::<Vec<_>>()
            .join("\n");

        Ok(transcript)
    }
}

#[async_trait]
impl TranscriptionClient for HttpTranscriptionClient {
    async fn start(&self, input_ref: &str) -> Result<String, StageError> {
        let request = StartRequest {
            content_urls: vec![input_ref],
            locale: &self.locale,
            display_name: "recap transcription",
        };

        let response = self
            .client
            .post(format!("{}/transcriptions", self.base_url))
            .header(SUBSCRIPTION_KEY_HEADER, &self.subscription_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StageError::Rejected(format!(
                "transcription start returned {}: {}",
                status, body
            )));
        }

        let started: StartResponse = response.json().await?;
        let handle = started
            .self_url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                StageError::Malformed(format!(
                    "transcription self url has no id segment: {}",
                    started.self_url
                ))
            })?;

        Ok(handle.to_string())
    }

    async fn poll(&self, handle: &str) -> Result<PollStatus, StageError> {
        let response = self
            .client
            .get(format!("{}/transcriptions/{}", self.base_url, handle))
            .header(SUBSCRIPTION_KEY_HEADER, &self.subscription_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StageError::Rejected(format!(
                "transcription status returned {}: {}",
                status, body
            )));
        }

        let status: StatusResponse = response.json().await?;
        match status.status.as_str() {
            "Succeeded" => {
                let transcript = self.fetch_transcript(&status).await?;
                Ok(PollStatus::Succeeded(transcript))
            }
            "Failed" => {
                let reason = status
                    .properties
                    .and_then(|p| p.error)
                    .map(|e| e.message)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "transcription failed".to_string());
                Ok(PollStatus::Failed(reason))
            }
            // NotStarted, Running, or anything the API adds later.
            _ => Ok(PollStatus::Pending),
        }
    }
}
