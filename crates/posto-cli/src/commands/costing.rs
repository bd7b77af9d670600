//! Costing command handlers: `report`, `product`, `preview`, `snapshot`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use posto_config::ConfigMode;
use posto_fifo::{
    compute_all_products, compute_fifo_report, compute_inventory_snapshot,
    compute_product_costing, preview_sale, BatchLedger, InventorySnapshotEntry, SaleCostResult,
    SnapshotBasis,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use super::{load_settings, print_json, LoadedSettings};
use crate::{BasisArg, LedgerArgs};

/// Config + ledger built from `--purchases`, with the start date resolved.
fn open_ledger(args: &LedgerArgs, mode: ConfigMode) -> Result<(LoadedSettings, BatchLedger)> {
    let loaded = load_settings(&args.config_paths, mode)?;
    let start_date = loaded.settings.effective_start_date(args.start_date);

    let batches = posto_loader::load_purchases_csv(&args.purchases)
        .with_context(|| format!("load purchases failed: {}", args.purchases.display()))?;
    let ledger = BatchLedger::new(batches, start_date).context("invalid purchase batch")?;

    info!(
        batches = ledger.len(),
        excluded_before_start = ledger.excluded_before_start(),
        start_date = ?start_date,
        config_hash = %loaded.config_hash,
        "ledger ready"
    );
    Ok((loaded, ledger))
}

fn load_sales(path: &Path) -> Result<Vec<posto_fifo::Sale>> {
    posto_loader::load_sales_csv(path)
        .with_context(|| format!("load sales failed: {}", path.display()))
}

/// Execute `posto report`.
pub fn report(args: &LedgerArgs, sales_path: &Path, adjustments_path: Option<&Path>) -> Result<()> {
    let (loaded, mut ledger) = open_ledger(args, ConfigMode::Report)?;
    let sales = load_sales(sales_path)?;
    let adjustments = match adjustments_path {
        Some(p) => posto_loader::load_adjustments_csv(p)
            .with_context(|| format!("load adjustments failed: {}", p.display()))?,
        None => Vec::new(),
    };

    let report = compute_fifo_report(&mut ledger, &sales, &adjustments)?;
    print_json("report", &loaded.config_hash, report)
}

/// Execute `posto product`.
pub fn product(args: &LedgerArgs, sales_path: &Path, code: &str) -> Result<()> {
    let (loaded, mut ledger) = open_ledger(args, ConfigMode::Product)?;
    let sales = load_sales(sales_path)?;

    let costing = compute_product_costing(&mut ledger, &sales, code)?;
    if costing.summary.sales_count == 0 {
        info!(product_code = code, "no sales for product");
    }
    print_json("product", &loaded.config_hash, costing)
}

#[derive(Serialize)]
struct PreviewOutput<'a> {
    product_code: &'a str,
    sale_date: NaiveDate,
    volume_requested: Decimal,
    after_sales: bool,
    cost: SaleCostResult,
}

/// Execute `posto preview`.
pub fn preview(
    args: &LedgerArgs,
    sales_path: Option<&Path>,
    code: &str,
    date: NaiveDate,
    volume: Decimal,
) -> Result<()> {
    let (loaded, mut ledger) = open_ledger(args, ConfigMode::Preview)?;
    if let Some(p) = sales_path {
        let sales = load_sales(p)?;
        compute_all_products(&mut ledger, &sales)?;
    }

    let cost = preview_sale(&ledger, code, date, volume)?;
    print_json(
        "preview",
        &loaded.config_hash,
        PreviewOutput {
            product_code: code,
            sale_date: date,
            volume_requested: volume,
            after_sales: sales_path.is_some(),
            cost,
        },
    )
}

#[derive(Serialize)]
struct SnapshotOutput {
    basis: SnapshotBasis,
    by_product: BTreeMap<String, InventorySnapshotEntry>,
}

/// Execute `posto snapshot`.
pub fn snapshot(args: &LedgerArgs, sales_path: Option<&Path>, basis: BasisArg) -> Result<()> {
    let (loaded, mut ledger) = open_ledger(args, ConfigMode::Snapshot)?;

    let basis = match (basis, sales_path) {
        (BasisArg::AsPurchased, _) => SnapshotBasis::AsPurchased,
        (BasisArg::AfterSales, Some(p)) => {
            let sales = load_sales(p)?;
            compute_all_products(&mut ledger, &sales)?;
            SnapshotBasis::AfterSales
        }
        (BasisArg::AfterSales, None) => {
            bail!("--basis after-sales needs --sales; use --basis as-purchased for delivered stock")
        }
    };

    let by_product = compute_inventory_snapshot(&mut ledger, basis)?;
    print_json("snapshot", &loaded.config_hash, SnapshotOutput { basis, by_product })
}
