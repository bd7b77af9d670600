//! Remaining-inventory valuation per product.
//!
//! The snapshot reads whatever the working batches hold, so the caller picks
//! the basis explicitly instead of depending on which pass ran last.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    error::{FifoError, OverflowRecord},
    ledger::BatchLedger,
    metrics::ratio,
    types::{InventorySnapshotEntry, PurchaseBatch},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotBasis {
    /// Reset the ledger first: inventory as delivered, before any sale.
    AsPurchased,
    /// Read the working state left by the last costing pass.
    AfterSales,
}

/// Group live batches by product and value what remains.
///
/// Products whose batches are all depleted do not appear.
///
/// # Errors
/// [`FifoError::ArithmeticOverflow`] when a batch value or a product total
/// leaves the `Decimal` range.
pub fn compute_inventory_snapshot(
    ledger: &mut BatchLedger,
    basis: SnapshotBasis,
) -> Result<BTreeMap<String, InventorySnapshotEntry>, FifoError> {
    if basis == SnapshotBasis::AsPurchased {
        ledger.reset();
    }
    snapshot_of(ledger.batches())
}

fn snapshot_of(
    batches: &[PurchaseBatch],
) -> Result<BTreeMap<String, InventorySnapshotEntry>, FifoError> {
    let mut out: BTreeMap<String, InventorySnapshotEntry> = BTreeMap::new();

    for batch in batches.iter().filter(|b| b.is_live()) {
        let entry = out
            .entry(batch.product_code.clone())
            .or_insert_with(|| InventorySnapshotEntry {
                total_remaining_volume: Decimal::ZERO,
                total_remaining_value: Decimal::ZERO,
                batch_count: 0,
                oldest_live_batch_date: batch.purchase_date,
                avg_cost_per_unit: Decimal::ZERO,
            });
        let overflow = || FifoError::overflow(OverflowRecord::Batch(batch.id), "inventory totals");
        entry.total_remaining_volume = entry
            .total_remaining_volume
            .checked_add(batch.remaining_volume)
            .ok_or_else(overflow)?;
        entry.total_remaining_value = entry
            .total_remaining_value
            .checked_add(batch.remaining_value()?)
            .ok_or_else(overflow)?;
        entry.batch_count += 1;
        entry.oldest_live_batch_date = entry.oldest_live_batch_date.min(batch.purchase_date);
    }

    for (code, entry) in out.iter_mut() {
        entry.avg_cost_per_unit = ratio(entry.total_remaining_value, entry.total_remaining_volume)
            .ok_or_else(|| FifoError::overflow(OverflowRecord::Product(code.clone()), "average cost"))?;
    }
    Ok(out)
}
