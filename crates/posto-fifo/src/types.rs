use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    error::{FifoError, OverflowRecord},
    metrics::{margin_percent, ratio},
};

pub type BatchId = i64;
pub type SaleId = i64;

/// Note attached to a [`SaleCostResult`] when the product had no batch at all
/// on or before the sale date (as opposed to running short part-way).
pub const NO_BATCHES_NOTE: &str = "no batches available";

/// Whether a batch can still be drawn from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Active,
    Depleted,
}

/// One purchase event (a fuel delivery) and what is left of it.
///
/// `original_volume` never changes. `remaining_volume` starts at the persisted
/// value supplied by the caller (partially consumed real data is allowed) and
/// only ever decreases while a costing pass runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseBatch {
    pub id: BatchId,
    pub product_code: String,
    pub purchase_date: NaiveDate,
    pub cost_per_unit: Decimal,
    pub original_volume: Decimal,
    pub remaining_volume: Decimal,
    #[serde(default)]
    pub invoice_reference: String,
}

impl PurchaseBatch {
    /// Fresh batch: remaining volume equals the received volume.
    pub fn new<S: Into<String>>(
        id: BatchId,
        product_code: S,
        purchase_date: NaiveDate,
        cost_per_unit: Decimal,
        original_volume: Decimal,
    ) -> Self {
        Self {
            id,
            product_code: product_code.into(),
            purchase_date,
            cost_per_unit,
            original_volume,
            remaining_volume: original_volume,
            invoice_reference: String::new(),
        }
    }

    /// Re-hydrate a partially consumed batch.
    pub fn with_remaining(mut self, remaining_volume: Decimal) -> Self {
        self.remaining_volume = remaining_volume;
        self
    }

    pub fn with_invoice<S: Into<String>>(mut self, invoice_reference: S) -> Self {
        self.invoice_reference = invoice_reference.into();
        self
    }

    pub fn is_live(&self) -> bool {
        self.remaining_volume > Decimal::ZERO
    }

    pub fn status(&self) -> BatchStatus {
        if self.is_live() {
            BatchStatus::Active
        } else {
            BatchStatus::Depleted
        }
    }

    /// Value of the volume still on hand at purchase cost.
    pub fn remaining_value(&self) -> Result<Decimal, FifoError> {
        self.remaining_volume
            .checked_mul(self.cost_per_unit)
            .ok_or_else(|| FifoError::overflow(OverflowRecord::Batch(self.id), "remaining value"))
    }
}

/// A recorded sale. Read-only input to the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub product_code: String,
    pub sale_date: NaiveDate,
    pub volume_sold: Decimal,
    pub total_revenue: Decimal,
}

impl Sale {
    pub fn new<S: Into<String>>(
        id: SaleId,
        product_code: S,
        sale_date: NaiveDate,
        volume_sold: Decimal,
        total_revenue: Decimal,
    ) -> Self {
        Self {
            id,
            product_code: product_code.into(),
            sale_date,
            volume_sold,
            total_revenue,
        }
    }
}

/// The slice of one batch consumed by one sale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub batch_id: BatchId,
    pub batch_date: NaiveDate,
    pub invoice_reference: String,
    pub volume_used: Decimal,
    pub cost_per_unit: Decimal,
    pub total_cost: Decimal,
}

/// Cost breakdown of a single sale.
///
/// `volume_allocated + volume_shortage == requested volume` always holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleCostResult {
    pub total_cogs: Decimal,
    /// COGS divided by the volume actually allocated (not requested).
    pub avg_cost_per_unit: Decimal,
    pub volume_allocated: Decimal,
    pub volume_shortage: Decimal,
    pub allocations: Vec<AllocationRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SaleCostResult {
    /// All-zero result: nothing requested, nothing allocated.
    pub fn zero() -> Self {
        Self {
            total_cogs: Decimal::ZERO,
            avg_cost_per_unit: Decimal::ZERO,
            volume_allocated: Decimal::ZERO,
            volume_shortage: Decimal::ZERO,
            allocations: Vec::new(),
            note: None,
        }
    }

    pub fn has_shortage(&self) -> bool {
        self.volume_shortage > Decimal::ZERO
    }

    /// Requested volume reconstructed from the result.
    pub fn volume_requested(&self) -> Decimal {
        self.volume_allocated.saturating_add(self.volume_shortage)
    }
}

/// Roll-up over many sales of one product (or over all products for totals).
///
/// Derived fields are always computed from the summed base fields by
/// [`ProductCostSummary::from_totals`]; they are never averaged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCostSummary {
    pub sales_count: usize,
    pub total_volume: Decimal,
    pub volume_allocated: Decimal,
    pub total_revenue: Decimal,
    pub total_cogs: Decimal,
    pub gross_profit: Decimal,
    pub margin_percent: Decimal,
    pub margin_per_unit: Decimal,
    pub avg_cost_per_unit: Decimal,
    pub avg_price_per_unit: Decimal,
    pub volume_shortage: Decimal,
}

impl ProductCostSummary {
    /// `None` when a derived quotient leaves the `Decimal` range.
    pub fn from_totals(
        sales_count: usize,
        total_volume: Decimal,
        volume_allocated: Decimal,
        total_revenue: Decimal,
        total_cogs: Decimal,
        volume_shortage: Decimal,
    ) -> Option<Self> {
        let gross_profit = total_revenue.checked_sub(total_cogs)?;
        Some(Self {
            sales_count,
            total_volume,
            volume_allocated,
            total_revenue,
            total_cogs,
            gross_profit,
            margin_percent: margin_percent(gross_profit, total_revenue)?,
            margin_per_unit: ratio(gross_profit, total_volume)?,
            avg_cost_per_unit: ratio(total_cogs, volume_allocated)?,
            avg_price_per_unit: ratio(total_revenue, total_volume)?,
            volume_shortage,
        })
    }

    pub fn empty() -> Self {
        Self {
            sales_count: 0,
            total_volume: Decimal::ZERO,
            volume_allocated: Decimal::ZERO,
            total_revenue: Decimal::ZERO,
            total_cogs: Decimal::ZERO,
            gross_profit: Decimal::ZERO,
            margin_percent: Decimal::ZERO,
            margin_per_unit: Decimal::ZERO,
            avg_cost_per_unit: Decimal::ZERO,
            avg_price_per_unit: Decimal::ZERO,
            volume_shortage: Decimal::ZERO,
        }
    }

    /// Sum the base fields of `self` and `other`, recomputing derived fields.
    pub fn combine(&self, other: &Self) -> Option<Self> {
        Self::from_totals(
            self.sales_count + other.sales_count,
            self.total_volume.checked_add(other.total_volume)?,
            self.volume_allocated.checked_add(other.volume_allocated)?,
            self.total_revenue.checked_add(other.total_revenue)?,
            self.total_cogs.checked_add(other.total_cogs)?,
            self.volume_shortage.checked_add(other.volume_shortage)?,
        )
    }
}

/// One costed sale, as listed in the FIFO report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleCostLine {
    pub sale_id: SaleId,
    pub date: NaiveDate,
    pub product_code: String,
    pub volume: Decimal,
    pub revenue: Decimal,
    pub cogs: Decimal,
    pub profit: Decimal,
    pub margin_percent: Decimal,
    pub volume_shortage: Decimal,
}

impl SaleCostLine {
    pub fn new(sale: &Sale, cost: &SaleCostResult) -> Result<Self, FifoError> {
        let overflow = || FifoError::overflow(OverflowRecord::Sale(sale.id), "sale margin");
        let profit = sale
            .total_revenue
            .checked_sub(cost.total_cogs)
            .ok_or_else(overflow)?;
        let margin_percent = margin_percent(profit, sale.total_revenue).ok_or_else(overflow)?;
        Ok(Self {
            sale_id: sale.id,
            date: sale.sale_date,
            product_code: sale.product_code.clone(),
            volume: sale.volume_sold,
            revenue: sale.total_revenue,
            cogs: cost.total_cogs,
            profit,
            margin_percent,
            volume_shortage: cost.volume_shortage,
        })
    }
}

/// Remaining inventory of one product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshotEntry {
    pub total_remaining_volume: Decimal,
    pub total_remaining_value: Decimal,
    /// Batches with remaining volume > 0.
    pub batch_count: usize,
    pub oldest_live_batch_date: NaiveDate,
    pub avg_cost_per_unit: Decimal,
}
