//! Full FIFO report: per-product summaries, totals, adjusted profit and the
//! per-sale lines, all taken from one committed pass.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    adjustments::{
        adjust_summary, summarize_adjustments, AdjustedResult, AdjustmentTotals,
        InventoryAdjustment,
    },
    aggregator::{compute_all_costings, sum_summaries},
    error::{FifoError, OverflowRecord},
    ledger::BatchLedger,
    types::{ProductCostSummary, Sale, SaleCostLine},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FifoReport {
    pub fifo_start_date: Option<NaiveDate>,
    pub by_product: BTreeMap<String, ProductCostSummary>,
    pub totals: ProductCostSummary,
    /// Keyed by every product that has sales or adjustments.
    pub adjustments_by_product: BTreeMap<String, AdjustedResult>,
    pub adjusted_totals: AdjustedResult,
    /// Every costed sale in `(sale_date, id)` order.
    pub sales: Vec<SaleCostLine>,
}

/// Cost all sales and fold inventory adjustments into adjusted profit.
///
/// Leaves the ledger in its after-sales state, like
/// [`compute_all_products`](crate::compute_all_products).
///
/// # Errors
/// [`FifoError`] for an invalid sale or adjustment. Adjustments are checked
/// before the ledger is touched.
pub fn compute_fifo_report(
    ledger: &mut BatchLedger,
    sales: &[Sale],
    adjustments: &[InventoryAdjustment],
) -> Result<FifoReport, FifoError> {
    let adjustment_totals = summarize_adjustments(adjustments)?;
    let costings = compute_all_costings(ledger, sales)?;

    let mut by_product: BTreeMap<String, ProductCostSummary> = BTreeMap::new();
    let mut lines: Vec<SaleCostLine> = Vec::new();
    for costing in costings {
        lines.extend(costing.lines);
        by_product.insert(costing.product_code, costing.summary);
    }
    lines.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.sale_id.cmp(&b.sale_id)));

    let totals = sum_summaries(by_product.values())?;

    let empty_summary = ProductCostSummary::empty();
    let no_adjustments = AdjustmentTotals::default();
    let mut adjustments_by_product: BTreeMap<String, AdjustedResult> = BTreeMap::new();
    for code in by_product.keys().chain(adjustment_totals.keys()) {
        if adjustments_by_product.contains_key(code) {
            continue;
        }
        let summary = by_product.get(code).unwrap_or(&empty_summary);
        let adj = adjustment_totals.get(code).unwrap_or(&no_adjustments);
        let adjusted = adjust_summary(summary, adj).ok_or_else(|| {
            FifoError::overflow(OverflowRecord::Product(code.clone()), "adjusted profit")
        })?;
        adjustments_by_product.insert(code.clone(), adjusted);
    }

    let adjusted_totals = adjustment_totals
        .values()
        .try_fold(AdjustmentTotals::default(), |acc, t| acc.combine(t))
        .and_then(|all| adjust_summary(&totals, &all))
        .ok_or_else(|| FifoError::overflow(OverflowRecord::Totals, "adjusted profit"))?;

    Ok(FifoReport {
        fifo_start_date: ledger.start_date(),
        by_product,
        totals,
        adjustments_by_product,
        adjusted_totals,
        sales: lines,
    })
}
