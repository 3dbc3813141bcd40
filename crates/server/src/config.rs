use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CubicConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub retention: RetentionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
    pub enable_cors: bool,
    /// `"*"` allows any origin (without credentials)
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// SQLite database file
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// When set, protected routes require `Authorization: <key>` or `Bearer <key>`
    pub api_key: Option<String>,
}

impl AuthConfig {
    /// Configured key, ignoring an empty string.
    pub fn key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    pub days: u32,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    File { path: String },
}

impl CubicConfig {
    /// Load configuration: defaults, then config files, then an explicit
    /// `--config` file, then `CUBICLOG_*` env vars, then the legacy
    /// `PORT`/`DB_PATH`/`API_KEY`/`RETENTION_DAYS` variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = config::Config::try_from(&CubicConfig::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);

        // 1. /etc/cubiclog/cubiclog.toml (system install)
        // 2. config/cubiclog.toml (local development)
        for path in ["/etc/cubiclog/cubiclog", "config/cubiclog"] {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        if let Some(path) = explicit {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        // Double underscore for nested keys: CUBICLOG_SERVER__BIND_ADDRESS
        builder = builder.add_source(
            config::Environment::with_prefix("CUBICLOG")
                .separator("__")
                .try_parsing(true),
        );

        for (key, value) in legacy_overrides(|name| std::env::var(name).ok()) {
            builder = builder
                .set_override(key, value)
                .with_context(|| format!("Invalid override for {}", key))?;
        }

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn validate(&self) -> Result<()> {
        self.server
            .bind_address
            .parse::<std::net::SocketAddr>()
            .context("Invalid bind_address")?;

        if self.retention.days == 0 {
            anyhow::bail!("retention.days must be at least 1");
        }
        if self.retention.sweep_interval_secs == 0 {
            anyhow::bail!("retention.sweep_interval_secs must be at least 1");
        }
        if self.storage.backend == StorageBackend::Sqlite && self.storage.path.trim().is_empty() {
            anyhow::bail!("storage.path is required for the sqlite backend");
        }

        Ok(())
    }
}

/// Plain variables accepted for compatibility with older deployments.
fn legacy_overrides(lookup: impl Fn(&str) -> Option<String>) -> Vec<(&'static str, config::Value)> {
    let mut overrides = Vec::new();
    let present = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(port) = present("PORT") {
        overrides.push(("server.bind_address", format!("0.0.0.0:{}", port).into()));
    }
    if let Some(path) = present("DB_PATH") {
        overrides.push(("storage.backend", "sqlite".into()));
        overrides.push(("storage.path", path.into()));
    }
    if let Some(key) = present("API_KEY") {
        overrides.push(("auth.api_key", key.into()));
    }
    if let Some(days) = present("RETENTION_DAYS").and_then(|d| d.parse::<i64>().ok()) {
        overrides.push(("retention.days", days.into()));
    }

    overrides
}

impl Default for CubicConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "0.0.0.0:8080".to_string(),
                request_timeout_secs: 30,
                max_body_bytes: 2 * 1024 * 1024,
                enable_cors: true,
                cors_origins: vec!["*".to_string()],
            },
            storage: StorageConfig {
                backend: StorageBackend::Sqlite,
                path: "./logs.db".to_string(),
            },
            auth: AuthConfig::default(),
            retention: RetentionConfig {
                days: 30,
                sweep_interval_secs: 3600,
            },
            logging: LoggingConfig {
                level: "info,cubiclog=debug,insight=debug".to_string(),
                format: LogFormat::Pretty,
                output: LogOutput::Stdout,
            },
        }
    }
}
