//! Which config keys each command reads, and the unused-key lint.
//!
//! The registry maps a [`ConfigMode`] to JSON Pointer prefixes; a leaf lying
//! under one of them is read by that command. [`EngineSettings`] asks the
//! registry before parsing a key, so a command never validates a key it does
//! not read.
//!
//! The lint sorts every leaf of the merged tree into three groups:
//! - read by this command
//! - read only by other commands (a shared station file carries these)
//! - read by no command at all: typos and stale keys, subject to
//!   [`UnusedKeyPolicy`]
//!
//! [`EngineSettings`]: crate::EngineSettings

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::settings::UnusedKeyPolicy;

/// The CLI command a configuration is loaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMode {
    Report,
    Product,
    Preview,
    Snapshot,
    Mix,
}

impl ConfigMode {
    pub const ALL: [ConfigMode; 5] = [
        ConfigMode::Report,
        ConfigMode::Product,
        ConfigMode::Preview,
        ConfigMode::Snapshot,
        ConfigMode::Mix,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigMode::Report => "REPORT",
            ConfigMode::Product => "PRODUCT",
            ConfigMode::Preview => "PREVIEW",
            ConfigMode::Snapshot => "SNAPSHOT",
            ConfigMode::Mix => "MIX",
        }
    }

    /// Whether this command reads the leaf at `pointer`.
    pub fn reads(self, pointer: &str) -> bool {
        consumed_pointers_for_mode(self)
            .iter()
            .any(|prefix| pointer_within(prefix, pointer))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    pub mode: String,
    /// Prefixes this command reads, sorted.
    pub consumed_prefixes: Vec<String>,
    /// Leaves no command reads, sorted. The policy applies to these.
    pub unused_leaf_pointers: Vec<String>,
    /// Leaves only other commands read, sorted. Never an error.
    pub other_mode_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Prefixes each command reads.
///
/// `/report/unused_keys` is read by every command since it decides how this
/// lint reacts.
pub fn consumed_pointers_for_mode(mode: ConfigMode) -> &'static [&'static str] {
    match mode {
        ConfigMode::Report | ConfigMode::Product | ConfigMode::Preview | ConfigMode::Snapshot => {
            &["/fifo/start_date", "/report/unused_keys"]
        }
        ConfigMode::Mix => &["/mix", "/report/unused_keys"],
    }
}

/// Lint the merged tree for `mode`.
///
/// Under [`UnusedKeyPolicy::Fail`] a leaf that no command reads is an error.
/// Leaves read only by other commands are listed but always allowed.
pub fn report_unused_keys(
    mode: ConfigMode,
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let consumed_prefixes: Vec<String> = consumed_pointers_for_mode(mode)
        .iter()
        .map(|p| normalize_pointer(p))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut leaves: Vec<String> = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);
    leaves.sort();
    leaves.dedup();

    let mut unused_leaf_pointers = Vec::new();
    let mut other_mode_leaf_pointers = Vec::new();
    for leaf in leaves {
        if mode.reads(&leaf) {
            continue;
        }
        if ConfigMode::ALL.iter().any(|other| other.reads(&leaf)) {
            other_mode_leaf_pointers.push(leaf);
        } else {
            unused_leaf_pointers.push(leaf);
        }
    }

    let report = UnusedKeyReport {
        mode: mode.as_str().to_string(),
        consumed_prefixes,
        unused_leaf_pointers,
        other_mode_leaf_pointers,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS (mode={}): no command reads {} key(s): {}",
            report.mode,
            report.unused_leaf_pointers.len(),
            first_n(&report.unused_leaf_pointers, 12)
        );
    }

    Ok(report)
}

/// Always a leading `/`, never a trailing one (except for the root itself).
fn normalize_pointer(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// `leaf` equals `prefix` or sits below it on a segment boundary, so `/mix`
/// covers `/mix/diesel/premium` and not `/mixer`.
fn pointer_within(prefix: &str, leaf: &str) -> bool {
    match leaf.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix == "/",
        None => false,
    }
}

/// Push the pointer of every scalar (null included) under `v`.
fn collect_leaf_pointers(v: &Value, at: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => map.iter().for_each(|(key, child)| {
            let token = key.replace('~', "~0").replace('/', "~1");
            collect_leaf_pointers(child, &format!("{at}/{token}"), out)
        }),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .for_each(|(i, child)| collect_leaf_pointers(child, &format!("{at}/{i}"), out)),
        _ if at.is_empty() => out.push("/".to_string()),
        _ => out.push(at.to_string()),
    }
}

fn first_n(items: &[String], n: usize) -> String {
    format!("{:?}", &items[..items.len().min(n)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefix_needs_segment_boundary() {
        assert!(pointer_within("/mix", "/mix/diesel/premium"));
        assert!(pointer_within("/mix", "/mix"));
        assert!(!pointer_within("/mix", "/mixer"));
        assert!(pointer_within("/", "/anything"));
    }

    #[test]
    fn pointer_tokens_are_escaped() {
        let mut out = Vec::new();
        collect_leaf_pointers(&json!({"a/b": {"c~d": 1}}), "", &mut out);
        assert_eq!(out, vec!["/a~1b/c~0d".to_string()]);
    }

    #[test]
    fn normalize_adds_slash_and_trims() {
        assert_eq!(normalize_pointer("fifo/"), "/fifo");
        assert_eq!(normalize_pointer(""), "/");
        assert_eq!(normalize_pointer(" /mix "), "/mix");
    }

    #[test]
    fn every_command_reads_the_lint_policy() {
        for mode in ConfigMode::ALL {
            assert!(mode.reads("/report/unused_keys"), "{}", mode.as_str());
        }
    }

    #[test]
    fn other_command_keys_are_separated_from_stray_keys() {
        let config = json!({
            "fifo": {"start_date": null},
            "mix": {"gasoline": {"premium": "GA"}},
            "fifo_typo": 1,
        });
        let report = report_unused_keys(ConfigMode::Mix, &config, UnusedKeyPolicy::Warn).unwrap();
        assert_eq!(report.other_mode_leaf_pointers, vec!["/fifo/start_date".to_string()]);
        assert_eq!(report.unused_leaf_pointers, vec!["/fifo_typo".to_string()]);
    }
}
