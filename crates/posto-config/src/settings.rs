use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use posto_fifo::{MixPairs, VariantPair};
use serde_json::Value;

use crate::consumption::ConfigMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnusedKeyPolicy {
    #[default]
    Warn,
    Fail,
}

impl UnusedKeyPolicy {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(UnusedKeyPolicy::Warn),
            "fail" => Ok(UnusedKeyPolicy::Fail),
            other => bail!("CONFIG_INVALID /report/unused_keys: expected warn|fail, got {other:?}"),
        }
    }
}

/// Typed view of the keys the engine reads.
///
/// Keys the command does not read keep their defaults and are not validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Batches purchased before this date are excluded from costing.
    pub fifo_start_date: Option<NaiveDate>,
    pub mix_pairs: MixPairs,
    pub unused_keys: UnusedKeyPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fifo_start_date: None,
            mix_pairs: MixPairs::default(),
            unused_keys: UnusedKeyPolicy::Warn,
        }
    }
}

impl EngineSettings {
    /// Read the settings `mode` uses from the merged config tree. Missing keys
    /// take defaults.
    pub fn from_config_json(config: &Value, mode: ConfigMode) -> Result<Self> {
        let mut settings = Self::default();

        if mode.reads("/fifo/start_date") {
            settings.fifo_start_date = match optional_str(config, "/fifo/start_date")? {
                Some(raw) => Some(NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").with_context(
                    || format!("CONFIG_INVALID /fifo/start_date: expected YYYY-MM-DD, got {raw:?}"),
                )?),
                None => None,
            };
        }

        if mode.reads("/mix") {
            let defaults = MixPairs::default();
            settings.mix_pairs = MixPairs {
                gasoline: VariantPair::new(
                    code_or(config, "/mix/gasoline/premium", &defaults.gasoline.premium)?,
                    code_or(config, "/mix/gasoline/standard", &defaults.gasoline.standard)?,
                ),
                diesel: VariantPair::new(
                    code_or(config, "/mix/diesel/premium", &defaults.diesel.premium)?,
                    code_or(config, "/mix/diesel/standard", &defaults.diesel.standard)?,
                ),
            };
        }

        if let Some(raw) = optional_str(config, "/report/unused_keys")? {
            settings.unused_keys = UnusedKeyPolicy::parse(raw)?;
        }

        Ok(settings)
    }

    /// CLI flag wins over config; config wins over none.
    pub fn effective_start_date(&self, cli_override: Option<NaiveDate>) -> Option<NaiveDate> {
        cli_override.or(self.fifo_start_date)
    }
}

/// `None` for a missing or null leaf; error for a non-string leaf.
fn optional_str<'a>(config: &'a Value, pointer: &str) -> Result<Option<&'a str>> {
    match config.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => bail!("CONFIG_INVALID {pointer}: expected string, got {other}"),
    }
}

fn code_or(config: &Value, pointer: &str, default: &str) -> Result<String> {
    match optional_str(config, pointer)? {
        Some(code) if !code.trim().is_empty() => Ok(code.trim().to_string()),
        Some(_) => bail!("CONFIG_INVALID {pointer}: product code must not be empty"),
        None => Ok(default.to_string()),
    }
}
