//! Allocator: costs one sale against the ledger in FIFO order.
//!
//! The walk is split in two steps:
//!
//! 1. `plan_allocation` reads the ledger through a shared borrow and decides
//!    which batches the sale draws from and how much.
//! 2. In [`AllocationMode::Commit`] the plan is applied to the working batches.
//!
//! A dry run never touches ledger state. Callers must not commit the same
//! sale twice; a preview followed by one commit is fine.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::{
    error::{FifoError, OverflowRecord},
    ledger::BatchLedger,
    metrics::ratio,
    types::{AllocationRecord, Sale, SaleCostResult, NO_BATCHES_NOTE},
};

/// Whether an allocation consumes batch volume.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AllocationMode {
    /// Decrement remaining volume of every batch drawn from.
    Commit,
    /// Compute the cost only ("what-if" displays); ledger unchanged.
    DryRun,
}

impl AllocationMode {
    pub fn mutates(self) -> bool {
        matches!(self, AllocationMode::Commit)
    }
}

struct AllocationPlan {
    result: SaleCostResult,
    /// `(working index, volume)` per batch drawn from, in ledger order.
    draws: Vec<(usize, Decimal)>,
}

/// Allocate `volume_requested` of `product_code` sold on `sale_date`.
///
/// Walks the live batches purchased on or before `sale_date` oldest first,
/// taking `min(still_needed, batch.remaining_volume)` from each. Volume that
/// no batch can cover is reported as `volume_shortage`.
///
/// # Errors
/// [`FifoError::NegativeVolume`] if `volume_requested < 0`, or
/// [`FifoError::ArithmeticOverflow`] naming the batch whose cost overflowed.
/// The ledger is not touched on error.
pub fn allocate_sale(
    ledger: &mut BatchLedger,
    product_code: &str,
    sale_date: NaiveDate,
    volume_requested: Decimal,
    mode: AllocationMode,
) -> Result<SaleCostResult, FifoError> {
    let plan = plan_allocation(ledger, product_code, sale_date, volume_requested)?;
    if mode.mutates() {
        for (index, volume) in &plan.draws {
            ledger.consume(*index, *volume);
        }
    }
    Ok(plan.result)
}

/// Dry-run allocation through a shared borrow.
///
/// Same result as [`allocate_sale`] with [`AllocationMode::DryRun`].
pub fn preview_sale(
    ledger: &BatchLedger,
    product_code: &str,
    sale_date: NaiveDate,
    volume_requested: Decimal,
) -> Result<SaleCostResult, FifoError> {
    plan_allocation(ledger, product_code, sale_date, volume_requested).map(|p| p.result)
}

/// Validate a [`Sale`] record and allocate it.
///
/// # Errors
/// [`FifoError`] naming the sale if its product code is blank or its volume
/// or revenue is negative.
pub fn cost_sale(
    ledger: &mut BatchLedger,
    sale: &Sale,
    mode: AllocationMode,
) -> Result<SaleCostResult, FifoError> {
    validate_sale(sale)?;
    allocate_sale(
        ledger,
        &sale.product_code,
        sale.sale_date,
        sale.volume_sold,
        mode,
    )
}

pub(crate) fn validate_sale(sale: &Sale) -> Result<(), FifoError> {
    if sale.product_code.trim().is_empty() {
        return Err(FifoError::EmptySaleProduct { sale_id: sale.id });
    }
    let non_negative = [
        ("volume_sold", sale.volume_sold),
        ("total_revenue", sale.total_revenue),
    ];
    for (field, value) in non_negative {
        if value < Decimal::ZERO {
            return Err(FifoError::NegativeSaleField {
                sale_id: sale.id,
                field,
                value,
            });
        }
    }
    Ok(())
}

fn plan_allocation(
    ledger: &BatchLedger,
    product_code: &str,
    sale_date: NaiveDate,
    volume_requested: Decimal,
) -> Result<AllocationPlan, FifoError> {
    if volume_requested < Decimal::ZERO {
        return Err(FifoError::NegativeVolume {
            volume: volume_requested,
        });
    }

    if volume_requested.is_zero() {
        return Ok(AllocationPlan {
            result: SaleCostResult::zero(),
            draws: Vec::new(),
        });
    }

    let available = ledger.available(product_code, sale_date);
    if available.is_empty() {
        warn!(
            product_code,
            %sale_date,
            volume = %volume_requested,
            "no batches available for sale"
        );
        return Ok(AllocationPlan {
            result: SaleCostResult {
                volume_shortage: volume_requested,
                note: Some(NO_BATCHES_NOTE.to_string()),
                ..SaleCostResult::zero()
            },
            draws: Vec::new(),
        });
    }

    let mut still_needed = volume_requested;
    let mut total_cogs = Decimal::ZERO;
    let mut allocations: Vec<AllocationRecord> = Vec::new();
    let mut draws: Vec<(usize, Decimal)> = Vec::new();

    for (index, batch) in available {
        if still_needed.is_zero() {
            break;
        }

        let volume_used = still_needed.min(batch.remaining_volume);
        let total_cost = volume_used
            .checked_mul(batch.cost_per_unit)
            .ok_or_else(|| FifoError::overflow(OverflowRecord::Batch(batch.id), "allocation cost"))?;
        total_cogs = total_cogs
            .checked_add(total_cost)
            .ok_or_else(|| FifoError::overflow(OverflowRecord::Batch(batch.id), "sale cogs"))?;

        allocations.push(AllocationRecord {
            batch_id: batch.id,
            batch_date: batch.purchase_date,
            invoice_reference: batch.invoice_reference.clone(),
            volume_used,
            cost_per_unit: batch.cost_per_unit,
            total_cost,
        });
        draws.push((index, volume_used));
        still_needed -= volume_used;
    }

    let volume_allocated = volume_requested - still_needed;
    let avg_cost_per_unit = ratio(total_cogs, volume_allocated).ok_or_else(|| {
        FifoError::overflow(OverflowRecord::Product(product_code.to_string()), "average cost")
    })?;

    if still_needed > Decimal::ZERO {
        warn!(
            product_code,
            %sale_date,
            requested = %volume_requested,
            shortage = %still_needed,
            "sale exceeds documented inventory"
        );
    }

    debug!(
        product_code,
        %sale_date,
        batches = allocations.len(),
        allocated = %volume_allocated,
        cogs = %total_cogs,
        "sale allocated"
    );

    Ok(AllocationPlan {
        result: SaleCostResult {
            total_cogs,
            avg_cost_per_unit,
            volume_allocated,
            volume_shortage: still_needed,
            allocations,
            note: None,
        },
        draws,
    })
}
