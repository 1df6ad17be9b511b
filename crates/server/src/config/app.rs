//! Application configuration for the Recap server.

use serde::Deserialize;

/// Job store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// PostgreSQL-backed store (durable).
    Postgres,
    /// In-process store, for tests and local development.
    Memory,
}

/// Provider wiring selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    /// Real HTTP providers.
    Http,
    /// Scripted in-process providers.
    Mock,
}

/// Application configuration loaded from environment variables.
///
/// Environment variables are prefixed with `RECAP_`:
/// - `RECAP_HOST`: Server bind address (default: "0.0.0.0")
/// - `RECAP_PORT`: Server port (default: 8084)
/// - `RECAP_SERVER_NAME`: Server name for identification
/// - `RECAP_STORE`: Job store backend, "postgres" or "memory" (default: "postgres")
/// - `RECAP_PROVIDERS`: Provider wiring, "http" or "mock" (default: "http")
/// - `RECAP_MEDIA_URL`: Media staging service base URL
/// - `RECAP_TRANSCRIPTION_URL`: Transcription service base URL
/// - `RECAP_TRANSCRIPTION_KEY`: Transcription service API key
/// - `RECAP_TRANSCRIPTION_LOCALE`: Transcription locale (default: "en-US")
/// - `RECAP_SUMMARIZER_URL`: Summarizer service base URL
/// - `RECAP_SUMMARIZER_KEY`: Summarizer service API key
/// - `RECAP_SUMMARIZER_MODEL`: Summarizer model name (default: "gpt-4o-mini")
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Server name for identification
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Job store backend
    #[serde(default = "default_store")]
    pub store: StoreBackend,

    /// Provider wiring
    #[serde(default = "default_providers")]
    pub providers: ProviderMode,

    /// Media staging service base URL
    #[serde(default = "default_media_url")]
    pub media_url: String,

    /// Transcription service base URL
    #[serde(default = "default_transcription_url")]
    pub transcription_url: String,

    /// Transcription service API key
    #[serde(default)]
    pub transcription_key: String,

    /// Transcription locale
    #[serde(default = "default_transcription_locale")]
    pub transcription_locale: String,

    /// Summarizer service base URL
    #[serde(default = "default_summarizer_url")]
    pub summarizer_url: String,

    /// Summarizer service API key
    #[serde(default)]
    pub summarizer_key: String,

    /// Summarizer model name
    #[serde(default = "default_summarizer_model")]
    pub summarizer_model: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8084
}

fn default_server_name() -> String {
    "recap-server".to_string()
}

fn default_store() -> StoreBackend {
    StoreBackend::Postgres
}

fn default_providers() -> ProviderMode {
    ProviderMode::Http
}

fn default_media_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_transcription_url() -> String {
    "http://localhost:9001".to_string()
}

fn default_transcription_locale() -> String {
    "en-US".to_string()
}

fn default_summarizer_url() -> String {
    "http://localhost:9002".to_string()
}

fn default_summarizer_model() -> String {
    "gpt-4o-mini".to_string()
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are prefixed with `RECAP_`.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("RECAP_").from_env::<AppConfig>()
    }

    /// Get the server bind address as a string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            server_name: default_server_name(),
            store: default_store(),
            providers: default_providers(),
            media_url: default_media_url(),
            transcription_url: default_transcription_url(),
            transcription_key: String::new(),
            transcription_locale: default_transcription_locale(),
            summarizer_url: default_summarizer_url(),
            summarizer_key: String::new(),
            summarizer_model: default_summarizer_model(),
        }
    }
}
