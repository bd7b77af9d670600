use std::path::Path;

use anyhow::{Context, Result};
use posto_config::ConfigMode;
use posto_fifo::{compute_mix, volumes_by_product};

use super::{load_settings, print_json};

/// Execute `posto mix`.
pub fn mix(sales_path: &Path, config_paths: &[String]) -> Result<()> {
    let loaded = load_settings(config_paths, ConfigMode::Mix)?;
    let sales = posto_loader::load_sales_csv(sales_path)
        .with_context(|| format!("load sales failed: {}", sales_path.display()))?;

    let mix = compute_mix(&volumes_by_product(&sales)?, &loaded.settings.mix_pairs)?;
    print_json("mix", &loaded.config_hash, mix)
}
