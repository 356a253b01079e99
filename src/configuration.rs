use config::ConfigError;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    pub webhook: WebhookSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

/// Deployment mode. Destructive admin operations are only mounted in `Dev`.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Dev,
    #[default]
    Production,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: Secret<String>,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    /// Skip Postgres entirely and keep all state in process memory.
    #[serde(default)]
    pub in_memory: bool,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> Secret<String> {
        Secret::new(format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port,
            self.database_name
        ))
    }
}

/// Access and refresh token settings
#[derive(Deserialize, Clone, Debug)]
pub struct JwtSettings {
    pub secret: Secret<String>,
    pub issuer: String,
    /// Default and maximum access token lifetime in seconds
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64,
    #[serde(default = "default_refresh_token_expiry_days")]
    pub refresh_token_expiry_days: i64,
}

impl JwtSettings {
    /// Refresh token lifetime, or `None` when `refresh_token_expiry_days` is outside
    /// `1..=MAX_REFRESH_TOKEN_EXPIRY_DAYS`.
    pub fn refresh_token_lifetime(&self) -> Option<chrono::Duration> {
        if (1..=MAX_REFRESH_TOKEN_EXPIRY_DAYS).contains(&self.refresh_token_expiry_days) {
            Some(chrono::Duration::days(self.refresh_token_expiry_days))
        } else {
            None
        }
    }
}

/// Credentials for server-to-server callers (the billing provider)
#[derive(Deserialize, Clone, Debug)]
pub struct WebhookSettings {
    pub api_key: Secret<String>,
}

/// Upper bound on access token lifetime regardless of configuration.
pub const MAX_ACCESS_TOKEN_EXPIRY: i64 = 3600;

/// Longest refresh token lifetime the server will start with, ten years.
pub const MAX_REFRESH_TOKEN_EXPIRY_DAYS: i64 = 3650;

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_static_dir() -> String {
    "./public".to_string()
}

fn default_access_token_expiry() -> i64 {
    MAX_ACCESS_TOKEN_EXPIRY
}

fn default_refresh_token_expiry_days() -> i64 {
    60
}

/// Load settings from `configuration.{yaml,toml,json}` overlaid with `APP_*` environment
/// variables, e.g. `APP_JWT__SECRET` or `APP_APPLICATION__PORT`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
