//! Command handler modules for posto.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod costing;
pub mod mix;

use anyhow::{Context, Result};
use posto_config::{report_unused_keys, ConfigMode, EngineSettings, LoadedConfig};
use serde::Serialize;
use tracing::{debug, warn};

/// Effective configuration for one command invocation.
pub struct LoadedSettings {
    pub config_hash: String,
    pub settings: EngineSettings,
}

/// Load layered config (or none), build the typed settings `mode` reads, and
/// run the unused-key lint.
pub fn load_settings(config_paths: &[String], mode: ConfigMode) -> Result<LoadedSettings> {
    let loaded = if config_paths.is_empty() {
        LoadedConfig::empty()?
    } else {
        let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
        posto_config::load_layered_yaml(&path_refs)?
    };

    let settings = EngineSettings::from_config_json(&loaded.config_json, mode)
        .context("config does not describe valid engine settings")?;

    let report = report_unused_keys(mode, &loaded.config_json, settings.unused_keys)?;
    if !report.is_clean() {
        warn!(
            mode = %report.mode,
            unused = ?report.unused_leaf_pointers,
            "config contains keys no command reads"
        );
    }
    if !report.other_mode_leaf_pointers.is_empty() {
        debug!(
            mode = %report.mode,
            skipped = ?report.other_mode_leaf_pointers,
            "config keys left to other commands"
        );
    }

    Ok(LoadedSettings {
        config_hash: loaded.config_hash,
        settings,
    })
}

/// Every command prints one pretty JSON document on stdout.
#[derive(Serialize)]
pub struct Output<'a, T: Serialize> {
    pub command: &'a str,
    pub config_hash: &'a str,
    pub result: T,
}

pub fn print_json<T: Serialize>(command: &str, config_hash: &str, result: T) -> Result<()> {
    let out = Output {
        command,
        config_hash,
        result,
    };
    let json = serde_json::to_string_pretty(&out).context("serialize output json failed")?;
    println!("{json}");
    Ok(())
}
