use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use discovery_engine::{ClientSettings, EngineSettings};
use log::LevelFilter;
use serde::Deserialize;

use crate::logging::LogDestination;

pub const DEFAULT_CONFIG_FILE: &str = "discovery.ron";

/// CLI configuration. Every field is optional in the RON file.
///
/// | Env Var                        | Field               |
/// |--------------------------------|---------------------|
/// | `DISCOVERY_CONFIG`             | path of the file    |
/// | `DISCOVERY_BASE_URL`           | `base_url`          |
/// | `DISCOVERY_POLL_DEADLINE_SECS` | `poll_deadline_secs`|
/// | `DISCOVERY_AUTO_RETRIES`       | `auto_retries`      |
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// `0` disables the poll deadline.
    pub poll_deadline_secs: u64,
    /// Automatic replays of a run that ended in an error.
    pub auto_retries: u32,
    /// Where the last completed result is kept.
    pub state_dir: PathBuf,
    pub log_destination: LogDestination,
    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        Self {
            base_url: client.base_url,
            connect_timeout_secs: client.connect_timeout.as_secs(),
            request_timeout_secs: client.request_timeout.as_secs(),
            poll_deadline_secs: 600,
            auto_retries: 1,
            state_dir: PathBuf::from("."),
            log_destination: LogDestination::File,
            verbose: false,
        }
    }
}

impl AppConfig {
    /// Reads the config file (if any) and applies environment overrides.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var("DISCOVERY_CONFIG").ok().map(PathBuf::from);
        let config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_ron(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_ron(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("DISCOVERY_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(raw) = lookup("DISCOVERY_POLL_DEADLINE_SECS") {
            self.poll_deadline_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("DISCOVERY_POLL_DEADLINE_SECS must be a number, got {raw:?}"))?;
        }
        if let Some(raw) = lookup("DISCOVERY_AUTO_RETRIES") {
            self.auto_retries = raw
                .trim()
                .parse()
                .with_context(|| format!("DISCOVERY_AUTO_RETRIES must be a number, got {raw:?}"))?;
        }
        Ok(self)
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            poll_deadline: (self.poll_deadline_secs > 0)
                .then(|| Duration::from_secs(self.poll_deadline_secs)),
            ..EngineSettings::default()
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
