//! Operator tooling for elwin.
//!
//! This crate provides:
//! - Unit parsing: `key=value` pairs from the command line into a [`UnitMap`]
//! - Document loading: a JSON configuration document into validated namespaces
//! - Rendering: resolved assignments and configuration summaries as JSON or text

use std::path::Path;
use std::str::FromStr;

use elwin_core::registry::USER_ID_UNIT;
use elwin_core::storage::ConfigDocument;
use elwin_core::{ConfigError, Namespace, StorageError, UnitMap};
use thiserror::Error;

pub mod render;
pub mod report;

pub use report::ConfigReport;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("unit `{0}` is not of the form key=value")]
    InvalidUnit(String),
    #[error("unknown output format `{0}` (expected json or plain)")]
    UnknownFormat(String),
    #[error("no units given: pass --user or at least one --unit")]
    NoUnits,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Plain,
}

impl FromStr for OutputFormat {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "plain" | "text" => Ok(Self::Plain),
            _ => Err(HarnessError::UnknownFormat(s.to_string())),
        }
    }
}

/// Split `key=value`. The value may itself contain `=`, and may be empty.
pub fn parse_unit(raw: &str) -> Result<(String, String), HarnessError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(HarnessError::InvalidUnit(raw.to_string())),
    }
}

/// Build the caller's unit map. `--user` fills the `userid` key; explicit
/// `--unit` pairs win over it.
pub fn build_units(user: Option<&str>, pairs: &[String]) -> Result<UnitMap, HarnessError> {
    let mut units = UnitMap::new();
    if let Some(user) = user {
        units.insert(USER_ID_UNIT.to_string(), user.to_string());
    }
    for pair in pairs {
        let (key, value) = parse_unit(pair)?;
        units.insert(key, value);
    }
    if units.is_empty() {
        return Err(HarnessError::NoUnits);
    }
    Ok(units)
}

/// Read, parse and validate a configuration document.
pub fn load_namespaces(path: &Path) -> Result<Vec<Namespace>, HarnessError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(ConfigDocument::parse(&raw)?.into_namespaces()?)
}
