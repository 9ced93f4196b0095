//! Runtime settings, read from the environment with platform defaults.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

pub const DATA_DIR_ENV: &str = "NEWSDRILL_DATA_DIR";
pub const MODEL_ENV: &str = "NEWSDRILL_MODEL";
pub const API_BASE_ENV: &str = "NEWSDRILL_API_BASE";
pub const TIMEOUT_ENV: &str = "NEWSDRILL_TIMEOUT_SECS";
pub const CEFR_ENV: &str = "NEWSDRILL_CEFR";

pub const DEFAULT_MODEL: &str = "gpt-5-nano";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// CEFR proficiency level used to calibrate generated content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum Cefr {
    A1,
    A2,
    B1,
    #[default]
    B2,
    C1,
    C2,
}

impl Cefr {
    pub fn as_str(self) -> &'static str {
        match self {
            Cefr::A1 => "A1",
            Cefr::A2 => "A2",
            Cefr::B1 => "B1",
            Cefr::B2 => "B2",
            Cefr::C1 => "C1",
            Cefr::C2 => "C2",
        }
    }

    /// The next easier level, if any.
    pub fn easier(self) -> Option<Cefr> {
        match self {
            Cefr::A1 => None,
            Cefr::A2 => Some(Cefr::A1),
            Cefr::B1 => Some(Cefr::A2),
            Cefr::B2 => Some(Cefr::B1),
            Cefr::C1 => Some(Cefr::B2),
            Cefr::C2 => Some(Cefr::C1),
        }
    }
}

impl fmt::Display for Cefr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cefr {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(Cefr::A1),
            "A2" => Ok(Cefr::A2),
            "B1" => Ok(Cefr::B1),
            "B2" => Ok(Cefr::B2),
            "C1" => Ok(Cefr::C1),
            "C2" => Ok(Cefr::C2),
            other => Err(anyhow!("Unknown CEFR level: {other:?}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub model: String,
    pub api_base: Option<String>,
    pub request_timeout: Duration,
    pub cefr: Cefr,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_dir = match get(DATA_DIR_ENV) {
            Some(dir) => PathBuf::from(dir.trim()),
            None => default_data_dir()?,
        };
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data dir {}", data_dir.display()))?;

        let model = get(MODEL_ENV)
            .map(|m| m.trim().to_string())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_base = get(API_BASE_ENV).map(|b| b.trim().trim_end_matches('/').to_string());

        let timeout_secs = match get(TIMEOUT_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{TIMEOUT_ENV} must be a number of seconds, got {raw:?}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let cefr = match get(CEFR_ENV) {
            Some(raw) => raw.parse().with_context(|| format!("Invalid {CEFR_ENV}"))?,
            None => Cefr::default(),
        };

        Ok(Self {
            data_dir,
            model,
            api_base,
            request_timeout: Duration::from_secs(timeout_secs),
            cefr,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("newsdrill.db")
    }

    pub fn auth_path(&self) -> PathBuf {
        self.data_dir.join("auth.json")
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "newsdrill")
        .ok_or_else(|| anyhow!("Could not determine project directory"))?;

    Ok(proj_dirs.data_dir().to_path_buf())
}
