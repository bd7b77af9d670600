//! Aggregator: drives the allocator over a sales list and folds results.
//!
//! Within one product the fold is strictly sequential: the cost of sale N
//! depends on the batch state left by sales 1..N-1. Products never share
//! batches, so each product pass is independent of the others once its own
//! batches are reset.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    allocator::{allocate_sale, validate_sale, AllocationMode},
    error::{FifoError, OverflowRecord},
    ledger::BatchLedger,
    ordering::product_sales_in_order,
    types::{ProductCostSummary, Sale, SaleCostLine, SaleCostResult},
};

/// Per-product summaries plus grand totals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllProductsReport {
    pub by_product: BTreeMap<String, ProductCostSummary>,
    /// Sum of the base fields across products; margin and per-unit figures
    /// recomputed from the sums.
    pub totals: ProductCostSummary,
}

/// Summary of one product together with its per-sale lines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCosting {
    pub product_code: String,
    pub summary: ProductCostSummary,
    pub lines: Vec<SaleCostLine>,
}

#[derive(Default)]
struct SummaryAccumulator {
    sales_count: usize,
    total_volume: Decimal,
    volume_allocated: Decimal,
    total_revenue: Decimal,
    total_cogs: Decimal,
    volume_shortage: Decimal,
}

impl SummaryAccumulator {
    fn record(&mut self, sale: &Sale, cost: &SaleCostResult) -> Result<(), FifoError> {
        let overflow = || FifoError::overflow(OverflowRecord::Sale(sale.id), "product totals");
        self.total_volume = self.total_volume.checked_add(sale.volume_sold).ok_or_else(overflow)?;
        self.volume_allocated = self
            .volume_allocated
            .checked_add(cost.volume_allocated)
            .ok_or_else(overflow)?;
        self.total_revenue = self
            .total_revenue
            .checked_add(sale.total_revenue)
            .ok_or_else(overflow)?;
        self.total_cogs = self.total_cogs.checked_add(cost.total_cogs).ok_or_else(overflow)?;
        self.volume_shortage = self
            .volume_shortage
            .checked_add(cost.volume_shortage)
            .ok_or_else(overflow)?;
        self.sales_count += 1;
        Ok(())
    }

    fn finish(self, product_code: &str) -> Result<ProductCostSummary, FifoError> {
        ProductCostSummary::from_totals(
            self.sales_count,
            self.total_volume,
            self.volume_allocated,
            self.total_revenue,
            self.total_cogs,
            self.volume_shortage,
        )
        .ok_or_else(|| {
            FifoError::overflow(OverflowRecord::Product(product_code.to_string()), "product summary")
        })
    }
}

/// Cost every sale of `product_code` after a full ledger reset.
///
/// Sales of other products in `sales` are ignored; sales with zero volume are
/// skipped and not counted.
///
/// # Errors
/// [`FifoError`] naming the first invalid sale of this product. Validation
/// runs before the reset, so the ledger is untouched on error.
pub fn compute_product_summary(
    ledger: &mut BatchLedger,
    sales: &[Sale],
    product_code: &str,
) -> Result<ProductCostSummary, FifoError> {
    compute_product_costing(ledger, sales, product_code).map(|c| c.summary)
}

/// Like [`compute_product_summary`], keeping the per-sale lines.
pub fn compute_product_costing(
    ledger: &mut BatchLedger,
    sales: &[Sale],
    product_code: &str,
) -> Result<ProductCosting, FifoError> {
    let ordered = product_sales_in_order(sales, product_code);
    for sale in &ordered {
        validate_sale(sale)?;
    }
    ledger.reset();
    run_product_pass(ledger, &ordered, product_code)
}

/// Cost all products found in `sales`.
///
/// The ledger is fully reset once, then each product's batches are reset
/// again right before its pass. After the call the ledger holds the state
/// left by every product's sales, which is what an after-sales
/// [`SnapshotBasis::AfterSales`](crate::SnapshotBasis) snapshot reads.
///
/// # Errors
/// [`FifoError`] naming the first invalid sale (validated before any reset).
pub fn compute_all_products(
    ledger: &mut BatchLedger,
    sales: &[Sale],
) -> Result<AllProductsReport, FifoError> {
    let by_product: BTreeMap<String, ProductCostSummary> = compute_all_costings(ledger, sales)?
        .into_iter()
        .map(|c| (c.product_code, c.summary))
        .collect();
    let totals = sum_summaries(by_product.values())?;
    Ok(AllProductsReport { by_product, totals })
}

pub(crate) fn compute_all_costings(
    ledger: &mut BatchLedger,
    sales: &[Sale],
) -> Result<Vec<ProductCosting>, FifoError> {
    for sale in sales {
        validate_sale(sale)?;
    }

    let codes: BTreeSet<&str> = sales.iter().map(|s| s.product_code.as_str()).collect();

    ledger.reset();
    let mut out: Vec<ProductCosting> = Vec::with_capacity(codes.len());
    for code in codes {
        ledger.reset_product(code);
        let ordered = product_sales_in_order(sales, code);
        out.push(run_product_pass(ledger, &ordered, code)?);
    }
    Ok(out)
}

/// Grand totals: base fields summed, derived fields recomputed.
pub(crate) fn sum_summaries<'a, I>(summaries: I) -> Result<ProductCostSummary, FifoError>
where
    I: IntoIterator<Item = &'a ProductCostSummary>,
{
    summaries
        .into_iter()
        .try_fold(ProductCostSummary::empty(), |acc, s| acc.combine(s))
        .ok_or_else(|| FifoError::overflow(OverflowRecord::Totals, "grand totals"))
}

fn run_product_pass(
    ledger: &mut BatchLedger,
    ordered: &[&Sale],
    product_code: &str,
) -> Result<ProductCosting, FifoError> {
    let mut acc = SummaryAccumulator::default();
    let mut lines: Vec<SaleCostLine> = Vec::with_capacity(ordered.len());

    for sale in ordered {
        if sale.volume_sold <= Decimal::ZERO {
            continue;
        }
        let cost = allocate_sale(
            ledger,
            product_code,
            sale.sale_date,
            sale.volume_sold,
            AllocationMode::Commit,
        )?;
        acc.record(sale, &cost)?;
        lines.push(SaleCostLine::new(sale, &cost)?);
    }

    let summary = acc.finish(product_code)?;
    info!(
        product_code,
        sales = summary.sales_count,
        cogs = %summary.total_cogs,
        margin_pct = %summary.margin_percent.round_dp(2),
        shortage = %summary.volume_shortage,
        "product costed"
    );

    Ok(ProductCosting {
        product_code: product_code.to_string(),
        summary,
        lines,
    })
}
