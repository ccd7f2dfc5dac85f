use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Secret used to sign local session tokens.
    pub token_secret: String,
    /// Session token lifetime in hours.
    pub token_ttl_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// How long guards wait for the session tracker to leave its loading
    /// state before failing closed, in milliseconds.
    pub ready_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory of the filesystem object store.
    pub root_dir: String,
    /// Maximum stored object size in bytes.
    pub max_object_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("auth.token_secret", "insecure-dev-secret")?
            .set_default("auth.token_ttl_hours", 24 * 7)?
            .set_default("session.ready_timeout_ms", 1_500)?
            .set_default("storage.root_dir", "./data/objects")?
            .set_default("storage.max_object_size", 50 * 1024 * 1024)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., GIGBOARD__AUTH__TOKEN_SECRET)
            .add_source(Environment::with_prefix("GIGBOARD").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
