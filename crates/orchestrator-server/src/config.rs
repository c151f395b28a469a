//! Server Configuration

use std::path::PathBuf;

use anyhow::Context;
use chrono::FixedOffset;
use classroom::calendar::{ist, parse_offset};

/// Settings read from the environment at startup
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Student roster for group forming
    pub roster_path: Option<PathBuf>,

    /// Student roster for mentor assignment; falls back to `roster_path`
    pub mentor_roster_path: Option<PathBuf>,

    /// School UTC offset for wall-clock times, e.g. `+05:30`
    pub utc_offset: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: var("PORT").and_then(|p| p.parse().ok()).unwrap_or(8001),
            roster_path: var("ROSTER_PATH").map(PathBuf::from),
            mentor_roster_path: var("MENTOR_ROSTER_PATH").map(PathBuf::from),
            utc_offset: var("SCHOOL_UTC_OFFSET"),
        }
    }

    /// Configured offset, IST when unset
    pub fn offset(&self) -> anyhow::Result<FixedOffset> {
        match &self.utc_offset {
            Some(raw) => parse_offset(raw).context("SCHOOL_UTC_OFFSET"),
            None => Ok(ist()),
        }
    }
}
