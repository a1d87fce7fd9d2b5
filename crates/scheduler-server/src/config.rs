use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use scheduler_core::models::DEFAULT_PAGE_SIZE;
use scheduler_core::timezone::{detect_system_timezone, validate_timezone};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "scheduler.toml";
pub const ENV_PREFIX: &str = "TODO_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// SQLite database file, created on first start
    pub database_path: String,
    /// Directory of static assets served for non-API paths
    pub web_dir: String,
    /// IANA timezone that decides what "today" is
    pub timezone: String,
    /// Number of tasks returned by the listing endpoint
    pub page_size: u32,
    /// Default `tracing` filter, overridden by `RUST_LOG`
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7540,
            database_path: "store/scheduler.db".to_string(),
            web_dir: "web".to_string(),
            timezone: detect_system_timezone(),
            page_size: DEFAULT_PAGE_SIZE,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Layers defaults, the TOML file and `TODO_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        validate_timezone(&self.timezone)?;
        anyhow::ensure!(self.page_size > 0, "page_size must be at least 1");
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
