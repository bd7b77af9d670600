//! posto-fifo
//!
//! FIFO inventory costing for fuel-station sales.
//! - Purchase batches are the source of truth (immutable source + working copy)
//! - Sales consume the oldest available batch first: `(purchase_date, id)`
//! - COGS, gross profit and margin per sale, per product, and in total
//! - Shortages are recorded data-quality signals, never errors
//! - Remaining-inventory valuation from the ledger state
//! - Pure deterministic logic (no IO, no clock, no globals)

mod adjustments;
mod error;
mod metrics;
mod ordering;
mod types;

pub mod aggregator;
pub mod allocator;
pub mod ledger;
pub mod mix;
pub mod report;
pub mod snapshot;

pub use adjustments::{
    adjust_summary, summarize_adjustments, AdjustedResult, AdjustmentKind, AdjustmentTotals,
    InventoryAdjustment,
};
pub use aggregator::{
    compute_all_products, compute_product_costing, compute_product_summary, AllProductsReport,
    ProductCosting,
};
pub use allocator::{allocate_sale, cost_sale, preview_sale, AllocationMode};
pub use error::{FifoError, OverflowRecord};
pub use ledger::BatchLedger;
pub use metrics::{conservation_tolerance, margin_percent, percent_of, ratio};
pub use mix::{compute_mix, volumes_by_product, MixPairs, ProductMix, VariantPair};
pub use ordering::{batch_fifo_order, sale_fifo_order, sort_batches_fifo, sort_sales_fifo};
pub use report::{compute_fifo_report, FifoReport};
pub use snapshot::{compute_inventory_snapshot, SnapshotBasis};

pub use types::{
    AllocationRecord, BatchId, BatchStatus, InventorySnapshotEntry, ProductCostSummary,
    PurchaseBatch, Sale, SaleCostLine, SaleCostResult, SaleId, NO_BATCHES_NOTE,
};
