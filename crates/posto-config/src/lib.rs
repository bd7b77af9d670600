//! posto-config
//!
//! Layered YAML configuration for the costing CLI.
//! - Layers merge in order; later documents override earlier ones
//! - The merged tree is canonicalised and hashed (SHA-256) so every report can
//!   name the exact configuration it ran with
//! - Literal credentials are refused; config stores env var NAMES only
//! - Unused-key lint per command mode (see [`consumption`])

use anyhow::{bail, Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

mod consumption;
mod settings;

pub use consumption::{consumed_pointers_for_mode, report_unused_keys, ConfigMode, UnusedKeyReport};
pub use settings::{EngineSettings, UnusedKeyPolicy};

/// Known secret-like prefixes. A leaf string value in the effective config
/// starting with one of these aborts the load with CONFIG_SECRET_DETECTED.
const SECRET_PREFIXES: &[&str] = &[
    "eyJ",        // JWT (Supabase anon / service_role keys)
    "sbp_",       // Supabase personal access token
    "sb_secret_", // Supabase secret API key
    "sk-",        // OpenAI style
    "sk_live",
    "sk_test",
    "AKIA",       // AWS access key ID
    "-----BEGIN", // PEM private keys
    "ghp_",       // GitHub PAT
    "glpat-",     // GitLab PAT
];

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// No layers: an empty object, still hashed.
    pub fn empty() -> Result<Self> {
        load_layered_yaml_from_strings(&[])
    }
}

/// Read and merge YAML files in order.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}")))
        .collect::<Result<Vec<String>>>()?;
    load_layered_yaml_from_strings(&docs.iter().map(String::as_str).collect::<Vec<_>>())
}

/// Merge YAML documents in order; a later document overrides leaves of an
/// earlier one and leaves its siblings alone.
pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Default::default());
    for (i, raw) in yaml_docs.iter().enumerate() {
        let layer: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("invalid yaml in layer {i}"))?;
        // An empty document parses as null; treat it as an empty layer.
        if layer.is_null() {
            continue;
        }
        let layer = serde_json::to_value(layer).context("yaml->json conversion failed")?;
        merge_into(&mut merged, layer);
    }

    reject_secret_literals(&merged, &mut String::new())?;

    // serde_json's default Map is a BTreeMap, so keys serialize sorted.
    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    Ok(LoadedConfig {
        config_hash: hex::encode(Sha256::digest(canonical_json.as_bytes())),
        canonical_json,
        config_json: merged,
    })
}

fn merge_into(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base_map), Value::Object(layer_map)) => {
            for (key, value) in layer_map {
                merge_into(base_map.entry(key).or_insert(Value::Null), value);
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Walk every string leaf; `at` holds the JSON pointer of `v`.
fn reject_secret_literals(v: &Value, at: &mut String) -> Result<()> {
    match v {
        Value::String(s) if looks_like_secret(s) => {
            bail!("CONFIG_SECRET_DETECTED leaf={at} value=REDACTED")
        }
        Value::Object(map) => {
            for (key, child) in map {
                let len = at.len();
                at.push('/');
                at.push_str(&key.replace('~', "~0").replace('/', "~1"));
                reject_secret_literals(child, at)?;
                at.truncate(len);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                let len = at.len();
                at.push_str(&format!("/{i}"));
                reject_secret_literals(child, at)?;
                at.truncate(len);
            }
        }
        _ => {}
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    t.len() >= 8 && SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}
