use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::types::DEFAULT_LOCK_STRIPES;

pub const DEFAULT_CONFIG_PATH: &str = "crabds.json";

/// Process configuration read at startup.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Listen address
    pub bind: String,
    /// Directory of the sled database
    pub db_path: String,
    /// Number of per-key lock stripes
    pub lock_stripes: usize,
    /// Default log filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Flush the engine before exiting
    pub flush_on_shutdown: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: "127.0.0.1:6378".into(),
            db_path: "crabds-data".into(),
            lock_stripes: DEFAULT_LOCK_STRIPES,
            log_level: "info".into(),
            flush_on_shutdown: true,
        }
    }
}

/// Read and deserialize a JSON config file.
///
/// A missing file is created with the defaults; the returned flag is `true`
/// in that case. Fields absent from an existing file take their default
/// values.
pub fn load<P: AsRef<Path>>(path: P) -> Result<(Config, bool)> {
    let path_ref = path.as_ref();

    if !path_ref.exists() {
        let default_cfg = Config::default();
        let default_json = serde_json::to_string_pretty(&default_cfg)?;
        fs::write(path_ref, default_json)
            .with_context(|| format!("Failed to write default config {:?}", path_ref))?;
        return Ok((default_cfg, true));
    }

    let data = fs::read_to_string(path_ref)
        .with_context(|| format!("Failed to read config file {:?}", path_ref))?;
    let cfg: Config = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse config file {:?}", path_ref))?;
    Ok((cfg, false))
}
