use anyhow::{Context, Result};
use chrono_tz::Tz;
use crewplan_core::CompanyConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::ensure_crewplan_home;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub company: CompanySection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySection {
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,
    /// IANA zone name, e.g. "Asia/Kolkata".
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_start_hour() -> u32 {
    10
}

fn default_end_hour() -> u32 {
    19
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for CompanySection {
    fn default() -> Self {
        Self {
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
            timezone: default_timezone(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub start_hour: Option<u32>,
    pub end_hour: Option<u32>,
    pub timezone: Option<String>,
}

impl Config {
    /// Resolve into a validated engine config.
    pub fn company_config(&self, overrides: &Overrides) -> Result<CompanyConfig> {
        let tz_name = overrides
            .timezone
            .as_deref()
            .unwrap_or(&self.company.timezone);
        let timezone: Tz = tz_name
            .parse()
            .map_err(|e| anyhow::anyhow!("unknown timezone {tz_name:?}: {e}"))?;

        let cfg = CompanyConfig::new(
            overrides.start_hour.unwrap_or(self.company.start_hour),
            overrides.end_hour.unwrap_or(self.company.end_hour),
        )
        .with_timezone(timezone);
        cfg.validate().context("invalid working hours")?;
        Ok(cfg)
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_crewplan_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
