use anyhow::{Context, Result, anyhow, bail};
use clap::ValueEnum;
use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use crate::cache::DEFAULT_FRESHNESS;
use crate::youtube::{DEFAULT_API_BASE, DEFAULT_REGION, DEFAULT_TIMEOUT, YouTubeSettings};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/tubefeed-env";
pub const DEFAULT_TUBEFEED_PORT: u16 = 8080;
pub const DEFAULT_TUBEFEED_HOST: &str = "127.0.0.1";
pub const DEFAULT_CACHE_DB_PATH: &str = "/var/lib/tubefeed/cache.db";

/// Which snapshot backend the server runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CacheBackendKind {
    #[default]
    Memory,
    Sqlite,
    None,
}

impl FromStr for CacheBackendKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            "none" | "off" | "disabled" => Ok(Self::None),
            other => Err(anyhow!("unknown cache backend {other:?}")),
        }
    }
}

/// Values as found in the config file and environment; anything unset
/// falls back to a default in [`EnvConfig::resolve`].
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub youtube_api_key: Option<String>,
    pub youtube_api_base: Option<String>,
    pub youtube_region: Option<String>,
    pub youtube_timeout_secs: Option<u64>,
    pub tubefeed_host: Option<String>,
    pub tubefeed_port: Option<u16>,
    pub cache_backend: Option<CacheBackendKind>,
    pub cache_db_path: Option<PathBuf>,
    pub cache_freshness_secs: Option<u64>,
    pub channel_catalogue: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub youtube: YouTubeSettings,
    pub host: String,
    pub port: u16,
    pub cache_backend: CacheBackendKind,
    pub cache_db_path: PathBuf,
    pub cache_freshness: Duration,
    pub channel_catalogue: Option<PathBuf>,
}

impl EnvConfig {
    /// Applies one `KEY=value` pair. Unknown keys are ignored so the file can
    /// be shared with other services; empty values leave the field unset.
    fn apply(&mut self, key: &str, value: &str, source: &str) -> Result<()> {
        let value = value.trim().trim_matches('"');
        if value.is_empty() {
            return Ok(());
        }
        match key {
            "YOUTUBE_API_KEY" => self.youtube_api_key = Some(value.to_string()),
            "YOUTUBE_API_BASE" => self.youtube_api_base = Some(value.to_string()),
            "YOUTUBE_REGION" => self.youtube_region = Some(value.to_string()),
            "YOUTUBE_TIMEOUT_SECS" => {
                let secs = value
                    .parse::<u64>()
                    .with_context(|| format!("Parsing YOUTUBE_TIMEOUT_SECS from {source}"))?;
                self.youtube_timeout_secs = Some(secs);
            }
            "TUBEFEED_HOST" => self.tubefeed_host = Some(value.to_string()),
            "TUBEFEED_PORT" => {
                let port = value
                    .parse::<u16>()
                    .with_context(|| format!("Parsing TUBEFEED_PORT from {source}"))?;
                self.tubefeed_port = Some(port);
            }
            "CACHE_BACKEND" => {
                let kind = value
                    .parse::<CacheBackendKind>()
                    .with_context(|| format!("Parsing CACHE_BACKEND from {source}"))?;
                self.cache_backend = Some(kind);
            }
            "CACHE_DB_PATH" => self.cache_db_path = Some(PathBuf::from(value)),
            "CACHE_FRESHNESS_SECS" => {
                let secs = value
                    .parse::<u64>()
                    .with_context(|| format!("Parsing CACHE_FRESHNESS_SECS from {source}"))?;
                if secs == 0 {
                    bail!("CACHE_FRESHNESS_SECS in {source} must be positive");
                }
                self.cache_freshness_secs = Some(secs);
            }
            "CHANNEL_CATALOGUE" => self.channel_catalogue = Some(PathBuf::from(value)),
            _ => {}
        }
        Ok(())
    }

    /// Overlays variables from the process environment (or any other
    /// key/value source) on top of the file values.
    pub fn overlay<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            self.apply(key.as_ref(), value.as_ref(), "environment")?;
        }
        Ok(())
    }

    pub fn resolve(self) -> Result<RuntimeConfig> {
        let api_key = self
            .youtube_api_key
            .ok_or_else(|| anyhow!("YOUTUBE_API_KEY is not set"))?;
        let youtube = YouTubeSettings {
            api_key,
            base_url: self
                .youtube_api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            region: self
                .youtube_region
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            timeout: self
                .youtube_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
        };

        Ok(RuntimeConfig {
            youtube,
            host: self
                .tubefeed_host
                .unwrap_or_else(|| DEFAULT_TUBEFEED_HOST.to_string()),
            port: self.tubefeed_port.unwrap_or(DEFAULT_TUBEFEED_PORT),
            cache_backend: self.cache_backend.unwrap_or_default(),
            cache_db_path: self
                .cache_db_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DB_PATH)),
            cache_freshness: self
                .cache_freshness_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_FRESHNESS),
            channel_catalogue: self.channel_catalogue,
        })
    }
}

pub fn read_env_config(path: &Path) -> Result<Option<EnvConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    let source = path.display().to_string();
    let mut cfg = EnvConfig::default();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = trimmed.split_once('=') {
            cfg.apply(key.trim(), value, &source)?;
        }
    }
    Ok(Some(cfg))
}

/// Keeps the environment entries that are valid UTF-8. None of our keys can
/// be spelled otherwise, and a setting with an undecodable value is treated
/// as unset.
fn utf8_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}

/// Reads the config file (missing is fine) and overlays the process
/// environment.
pub fn load_runtime_config(path: &Path) -> Result<RuntimeConfig> {
    let mut cfg = read_env_config(path)?.unwrap_or_default();
    cfg.overlay(utf8_vars(std::env::vars_os()))?;
    cfg.resolve()
        .with_context(|| format!("Resolving configuration from {}", path.display()))
}
