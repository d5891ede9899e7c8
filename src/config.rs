use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_ASSETS_DIR: &str = "dist";

/// Which collection the process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    #[default]
    Notes,
    Tasks,
}

impl FromStr for Variant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "notes" | "second-brain" => Ok(Variant::Notes),
            "tasks" | "task-manager" => Ok(Variant::Tasks),
            other => Err(ConfigError::Invalid {
                var: "APP_VARIANT",
                value: other.to_string(),
                reason: "expected 'notes' or 'tasks'".into(),
            }),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Notes => f.write_str("notes"),
            Variant::Tasks => f.write_str("tasks"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prefix for absolute asset and widget links, without trailing `/`.
    pub base_url: String,
    pub host: String,
    pub port: u16,
    /// Directory holding the compiled widget bundle.
    pub assets_dir: PathBuf,
    pub variant: Variant,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            variant: Variant::default(),
        }
    }
}

impl Config {
    /// Read `BASE_URL`, `HOST`, `PORT`, `ASSETS_DIR` and `APP_VARIANT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Config::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("BASE_URL") {
            cfg.base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(host) = get("HOST") {
            cfg.host = host.trim().to_string();
        }
        if let Some(port) = get("PORT") {
            cfg.port = port.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                var: "PORT",
                value: port.clone(),
                reason: e.to_string(),
            })?;
        }
        if let Some(dir) = get("ASSETS_DIR") {
            cfg.assets_dir = PathBuf::from(dir);
        }
        if let Some(variant) = get("APP_VARIANT") {
            cfg.variant = variant.parse()?;
        }
        Ok(cfg)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
