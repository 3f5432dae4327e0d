use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub socket: SocketSettings,
    #[serde(default)]
    pub judge: JudgeSettings,
    #[serde(default)]
    pub tournament: TournamentSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
    pub workers: Option<usize>,
    #[serde(default = "default_max_frame_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_http_port(),
            workers: None,
            max_body_bytes: default_max_frame_bytes(),
        }
    }
}

/// Length-prefixed TCP transport used by predictor clients
#[derive(Debug, Clone, Deserialize)]
pub struct SocketSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_socket_port")]
    pub port: u16,
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for SocketSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_socket_port(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JudgeSettings {
    #[serde(default = "default_judge_url")]
    pub base_url: String,
    #[serde(default = "default_judge_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

impl Default for JudgeSettings {
    fn default() -> Self {
        Self {
            base_url: default_judge_url(),
            model: default_judge_model(),
            temperature: 0.0,
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TournamentSettings {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
}

impl Default for TournamentSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            max_rounds: default_max_rounds(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_http_port() -> u16 { 8080 }
fn default_socket_port() -> u16 { 5000 }
fn default_max_frame_bytes() -> usize { 16 * 1024 * 1024 }
fn default_judge_url() -> String { "http://127.0.0.1:11434".to_string() }
fn default_judge_model() -> String { "gemma3:12b".to_string() }
fn default_call_timeout_secs() -> u64 { 120 }
fn default_chunk_size() -> usize { crate::core::chunker::DEFAULT_CHUNK_SIZE }
fn default_max_attempts() -> u32 { 3 }
fn default_backoff_base_ms() -> u64 { 250 }
fn default_backoff_max_ms() -> u64 { 5_000 }
fn default_max_rounds() -> usize { 16 }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "pretty".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with MATCHER__)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., MATCHER__TOURNAMENT__CHUNK_SIZE -> tournament.chunk_size
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("MATCHER")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
