use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::Result;
use ddreport_core::fetch::DEFAULT_API_URL;
use ddreport_core::{FetchOptions, ReportOptions};
use serde::Deserialize;

use crate::palette::Palette;

static CONFIG: OnceLock<DdreportConfig> = OnceLock::new();

const API_URL_ENV: &str = "DDREPORT_API_URL";
const CONFIG_PATH_ENV: &str = "DDREPORT_CONFIG";
const MIN_TIMEOUT_SECS: u64 = 1;
const MAX_TIMEOUT_SECS: u64 = 300;

/// Optional `~/.ddreport` TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DdreportConfig {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub utc_offset_hours: Option<i32>,
    /// TrueType font used for every label instead of the downloaded Figtree pair.
    #[serde(default)]
    pub font: Option<PathBuf>,
    /// Category name → `#rrggbb`.
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl DdreportConfig {
    fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::home_dir().map(|h| h.join(".ddreport"))
    }

    pub fn load() -> &'static DdreportConfig {
        CONFIG.get_or_init(|| {
            let Some(path) = Self::config_path() else {
                return Self::default();
            };
            let Ok(content) = fs::read_to_string(&path) else {
                return Self::default();
            };
            Self::from_toml_str(&content).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), %err, "ignoring unreadable config");
                Self::default()
            })
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Priority: CLI flag > `DDREPORT_API_URL` > config file > built-in default.
    pub fn api_url(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| std::env::var(API_URL_ENV).ok().filter(|v| !v.is_empty()))
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn fetch_options(&self, api_url_flag: Option<&str>) -> FetchOptions {
        let defaults = FetchOptions::default();
        FetchOptions {
            base_url: self.api_url(api_url_flag),
            timeout: self
                .timeout_secs
                .map(|secs| Duration::from_secs(secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS)))
                .unwrap_or(defaults.timeout),
            connect_timeout: defaults.connect_timeout,
        }
    }

    pub fn report_options(&self, offset_flag: Option<i32>) -> Result<ReportOptions> {
        match offset_flag.or(self.utc_offset_hours) {
            Some(hours) => ReportOptions::with_offset_hours(hours)
                .ok_or_else(|| anyhow::anyhow!("UTC offset out of range: {hours} hours")),
            None => Ok(ReportOptions::default()),
        }
    }

    pub fn palette(&self) -> Palette {
        Palette::default().with_overrides(&self.colors)
    }
}
