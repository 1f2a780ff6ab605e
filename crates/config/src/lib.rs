use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "threadline.toml",
    "config/threadline.toml",
    "crates/config/threadline.toml",
    "../threadline.toml",
    "../config/threadline.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub service: ServiceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            service: ServiceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://threadline.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Tunables for the conversation and message services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Per-call timeout for persistence operations, in seconds.
    #[serde(default = "ServiceConfig::default_operation_timeout")]
    pub operation_timeout_seconds: u64,
    /// Page size used when a listing request does not specify one.
    #[serde(default = "ServiceConfig::default_page_size")]
    pub default_page_size: u32,
    /// Hard upper bound on requested page sizes.
    #[serde(default = "ServiceConfig::default_max_page_size")]
    pub max_page_size: u32,
}

impl ServiceConfig {
    const fn default_operation_timeout() -> u64 {
        5
    }

    const fn default_page_size() -> u32 {
        20
    }

    const fn default_max_page_size() -> u32 {
        100
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            operation_timeout_seconds: Self::default_operation_timeout(),
            default_page_size: Self::default_page_size(),
            max_page_size: Self::default_max_page_size(),
        }
    }
}

/// Load the configuration by combining defaults, an optional file, and environment overrides.
///
/// ```
/// use threadline_config::load;
///
/// std::env::remove_var("THREADLINE_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.database.url.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder();
    builder = builder
        .set_default("database.url", defaults.database.url.clone())
        .unwrap()
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )
        .unwrap()
        .set_default(
            "service.operation_timeout_seconds",
            i64::try_from(defaults.service.operation_timeout_seconds).unwrap_or(i64::MAX),
        )
        .unwrap()
        .set_default(
            "service.default_page_size",
            i64::from(defaults.service.default_page_size),
        )
        .unwrap()
        .set_default(
            "service.max_page_size",
            i64::from(defaults.service.max_page_size),
        )
        .unwrap();

    let environment_overrides = config::Environment::with_prefix("THREADLINE").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("THREADLINE_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via THREADLINE_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    debug!(?config, "loaded threadline configuration");
    Ok(config)
}
