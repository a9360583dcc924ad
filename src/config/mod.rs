use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use url::Url;

/// Errors raised while resolving or validating configuration.
///
/// Any of these is fatal at startup: the process must not serve traffic
/// with a configuration that is invalid for its selected mode.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read env file {path}: {reason}")]
    EnvFile { path: PathBuf, reason: String },

    #[error("DISABLE_AUTH must not be enabled in production")]
    AuthDisabledInProduction,
}

/// Which backend serves tabular data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceKind {
    Synthetic,
    Rest,
    Sql,
}

impl FromStr for DataSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SYNTHETIC" => Ok(DataSourceKind::Synthetic),
            "REST" => Ok(DataSourceKind::Rest),
            "SQL" => Ok(DataSourceKind::Sql),
            other => Err(format!("unknown data source {other:?}")),
        }
    }
}

impl fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataSourceKind::Synthetic => "SYNTHETIC",
            DataSourceKind::Rest => "REST",
            DataSourceKind::Sql => "SQL",
        };
        write!(f, "{name}")
    }
}

/// Which cache store backs the cache layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Simple,
    Redis,
}

impl FromStr for CacheKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simplecache" => Ok(CacheKind::Simple),
            "rediscache" => Ok(CacheKind::Redis),
            other => Err(format!("unknown cache type {other:?}")),
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CacheKind::Simple => "SimpleCache",
            CacheKind::Redis => "RedisCache",
        };
        write!(f, "{name}")
    }
}

/// Process-wide application settings.
///
/// Resolved once at startup from layered `.env*` files overridden by the
/// real process environment, then shared read-only (`Arc<Settings>`) across
/// every component. A restart is required to pick up changes.
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_env: String,
    pub app_title: String,
    pub port: u16,
    pub debug: bool,
    pub disable_auth: bool,
    pub jwt_secret: String,
    pub data_source: DataSourceKind,
    pub api_base_url: Option<Url>,
    pub db_url: Option<String>,
    pub max_rows: usize,
    pub cache_type: CacheKind,
    pub redis_url: Option<String>,
    pub cache_timeout_seconds: u64,
}

const DEFAULT_APP_TITLE: &str = "Enterprise Analytics Dashboard";
const DEFAULT_PORT: u16 = 8050;
const DEFAULT_MAX_ROWS: usize = 7000;
const DEFAULT_CACHE_TIMEOUT_SECONDS: u64 = 24 * 60 * 60;

impl Settings {
    /// Load settings from `.env*` files in the current directory plus the
    /// process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let process_env: HashMap<String, String> = env::vars().collect();
        Self::resolve(Path::new("."), &process_env)
    }

    /// Resolve settings against an explicit directory and environment map.
    ///
    /// File precedence, lowest to highest: `.env`, `.env.dev`,
    /// `.env.{APP_ENV}`, `.env.local`, `.env.{APP_ENV}.local`. Entries in
    /// `process_env` win over every file. `APP_ENV` itself is taken from
    /// `process_env` or the base files, since it names the later layers.
    pub fn resolve(
        dir: &Path,
        process_env: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut vars = HashMap::new();
        merge_env_file(&mut vars, &dir.join(".env"))?;
        merge_env_file(&mut vars, &dir.join(".env.dev"))?;

        let app_env = process_env
            .get("APP_ENV")
            .or_else(|| vars.get("APP_ENV"))
            .cloned()
            .unwrap_or_else(|| "dev".to_string());

        merge_env_file(&mut vars, &dir.join(format!(".env.{app_env}")))?;
        merge_env_file(&mut vars, &dir.join(".env.local"))?;
        merge_env_file(&mut vars, &dir.join(format!(".env.{app_env}.local")))?;

        for (key, value) in process_env {
            vars.insert(key.clone(), value.clone());
        }

        Self::from_map(app_env, &vars)
    }

    fn from_map(app_env: String, vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_value(vars, "PORT")?.unwrap_or(DEFAULT_PORT);
        if port == 0 {
            return Err(ConfigError::Invalid {
                key: "PORT",
                value: "0".to_string(),
                reason: "port must be between 1 and 65535".to_string(),
            });
        }

        let max_rows: usize = parse_value(vars, "MAX_ROWS")?.unwrap_or(DEFAULT_MAX_ROWS);
        if max_rows < 1 {
            return Err(ConfigError::Invalid {
                key: "MAX_ROWS",
                value: max_rows.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let settings = Settings {
            app_title: non_empty(vars, "APP_TITLE")
                .unwrap_or(DEFAULT_APP_TITLE)
                .to_string(),
            port,
            debug: parse_bool(vars, "DEBUG")?.unwrap_or(false),
            disable_auth: parse_bool(vars, "DISABLE_AUTH")?.unwrap_or(false),
            jwt_secret: vars
                .get("JWT_SECRET")
                .cloned()
                .unwrap_or_else(|| "dev-secret".to_string()),
            data_source: parse_value(vars, "DATA_SOURCE")?.unwrap_or(DataSourceKind::Synthetic),
            api_base_url: parse_url(vars, "API_BASE_URL")?,
            db_url: non_empty(vars, "DB_URL").map(str::to_string),
            max_rows,
            cache_type: parse_value(vars, "CACHE_TYPE")?.unwrap_or(CacheKind::Simple),
            redis_url: non_empty(vars, "REDIS_URL").map(str::to_string),
            cache_timeout_seconds: parse_value(vars, "CACHE_TIMEOUT_SECONDS")?
                .unwrap_or(DEFAULT_CACHE_TIMEOUT_SECONDS),
            app_env,
        };

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.data_source {
            DataSourceKind::Rest if self.api_base_url.is_none() => {
                return Err(ConfigError::Missing("API_BASE_URL"));
            }
            DataSourceKind::Sql if self.db_url.is_none() => {
                return Err(ConfigError::Missing("DB_URL"));
            }
            _ => {}
        }

        if self.cache_type == CacheKind::Redis && self.redis_url.is_none() {
            return Err(ConfigError::Missing("REDIS_URL"));
        }

        if !self.disable_auth && self.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }

        if self.disable_auth && self.is_production() {
            return Err(ConfigError::AuthDisabledInProduction);
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        matches!(self.app_env.as_str(), "production" | "prod")
    }
}

fn merge_env_file(vars: &mut HashMap<String, String>, path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        return Ok(());
    }
    let iter = dotenvy::from_path_iter(path).map_err(|e| ConfigError::EnvFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    for item in iter {
        let (key, value) = item.map_err(|e| ConfigError::EnvFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        vars.insert(key, value);
    }
    Ok(())
}

fn non_empty<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn parse_value<T>(vars: &HashMap<String, String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match non_empty(vars, key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                key,
                value: raw.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

fn parse_bool(vars: &HashMap<String, String>, key: &'static str) -> Result<Option<bool>, ConfigError> {
    match non_empty(vars, key) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::Invalid {
                key,
                value: raw.to_string(),
                reason: "expected a boolean (1/0/true/false)".to_string(),
            }),
        },
        None => Ok(None),
    }
}

fn parse_url(vars: &HashMap<String, String>, key: &'static str) -> Result<Option<Url>, ConfigError> {
    match non_empty(vars, key) {
        Some(raw) => Url::parse(raw).map(Some).map_err(|e| ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(None),
    }
}
