use std::env;
use std::path::Path;

use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::ConfigurationError;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub tips: TipsConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub otel: OtelConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// Shared service key. When unset every caller is accepted.
    pub key: Option<String>,
}

/// Push delivery settings.
///
/// The signing identity comes from a provider service account, given either
/// inline (`service_account_json`) or as a file (`service_account_path`).
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    pub service_account_json: Option<String>,
    pub service_account_path: Option<String>,
    /// Overrides the `token_uri` from the service account
    pub token_endpoint: Option<String>,
    #[serde(default = "default_push_scope")]
    pub scope: String,
    #[serde(default = "default_fcm_base_url")]
    pub fcm_base_url: String,
    /// Per-recipient delivery timeout in milliseconds
    #[serde(default = "default_delivery_timeout_ms")]
    pub delivery_timeout_ms: u64,
    #[serde(default = "default_max_concurrent_deliveries")]
    pub max_concurrent_deliveries: usize,
    /// Reuse bearer tokens across batches until they near expiry
    #[serde(default = "default_true")]
    pub token_cache: bool,
}

/// Provider service account, as downloaded from the provider console.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// "postgres" or "memory"
    #[serde(default = "default_database_backend")]
    pub backend: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Trips starting within this many days are checked
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: i64,
    /// Pause between weather API calls during a sweep
    #[serde(default = "default_request_spacing_ms")]
    pub request_spacing_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TipsConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_tips_base_url")]
    pub base_url: String,
    #[serde(default = "default_tips_model")]
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_email_base_url")]
    pub base_url: String,
    #[serde(default = "default_email_from")]
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_true() -> bool {
    true
}

fn default_push_scope() -> String {
    "https://www.googleapis.com/auth/firebase.messaging".to_string()
}

fn default_fcm_base_url() -> String {
    "https://fcm.googleapis.com".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_delivery_timeout_ms() -> u64 {
    10_000 // 10 seconds
}

fn default_max_concurrent_deliveries() -> usize {
    32
}

fn default_database_backend() -> String {
    "postgres".to_string()
}

fn default_pool_size() -> u32 {
    10
}

fn default_connect_timeout() -> u32 {
    5
}

fn default_idle_timeout() -> u32 {
    300
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_lookahead_days() -> i64 {
    7
}

fn default_request_spacing_ms() -> u64 {
    100
}

fn default_tips_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_tips_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_email_base_url() -> String {
    "https://api.resend.com".to_string()
}

fn default_email_from() -> String {
    "Waylo Support <support@waylo.app>".to_string()
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "waylo-notification-service".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8081)?
            .set_default("database.backend", "postgres")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // SERVER__PORT, PUSH__SERVICE_ACCOUNT_PATH, DATABASE__URL, ...
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl PushConfig {
    /// Resolve the service account, preferring the inline JSON over the file.
    pub fn service_account(&self) -> Result<ServiceAccount, ConfigurationError> {
        let raw = match (&self.service_account_json, &self.service_account_path) {
            (Some(json), _) if !json.trim().is_empty() => json.clone(),
            (_, Some(path)) if !path.trim().is_empty() => read_service_account_file(path)?,
            _ => return Err(ConfigurationError::MissingSigningKey),
        };

        let account: ServiceAccount = serde_json::from_str(&raw)
            .map_err(|e| ConfigurationError::InvalidServiceAccount(e.to_string()))?;

        if account.private_key.trim().is_empty() || account.client_email.trim().is_empty() {
            return Err(ConfigurationError::MissingSigningKey);
        }

        Ok(account)
    }
}

fn read_service_account_file(path: &str) -> Result<String, ConfigurationError> {
    std::fs::read_to_string(Path::new(path)).map_err(|e| {
        ConfigurationError::InvalidServiceAccount(format!("cannot read {}: {}", path, e))
    })
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            service_account_json: None,
            service_account_path: None,
            token_endpoint: None,
            scope: default_push_scope(),
            fcm_base_url: default_fcm_base_url(),
            delivery_timeout_ms: default_delivery_timeout_ms(),
            max_concurrent_deliveries: default_max_concurrent_deliveries(),
            token_cache: true,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_database_backend(),
            url: String::new(),
            pool_size: default_pool_size(),
            connect_timeout_seconds: default_connect_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            lookahead_days: default_lookahead_days(),
            request_spacing_ms: default_request_spacing_ms(),
        }
    }
}

impl Default for TipsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_tips_base_url(),
            model: default_tips_model(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_email_base_url(),
            from: default_email_from(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            api: ApiConfig::default(),
            push: PushConfig::default(),
            database: DatabaseConfig::default(),
            weather: WeatherConfig::default(),
            tips: TipsConfig::default(),
            email: EmailConfig::default(),
            otel: OtelConfig::default(),
            log: LogConfig::default(),
        }
    }
}
