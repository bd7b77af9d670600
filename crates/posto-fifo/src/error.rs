use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{BatchId, SaleId};

/// Input validation faults. These are caller errors: the engine refuses the
/// input instead of producing negative costs from it.
///
/// Shortages are NOT errors; they are reported in the result structs.
///
/// Arithmetic is checked: a product or sum that leaves the `Decimal` range
/// surfaces as [`FifoError::ArithmeticOverflow`] naming the record involved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FifoError {
    #[error("batch {batch_id}: product_code must not be empty")]
    EmptyBatchProduct { batch_id: BatchId },

    #[error("batch {batch_id}: {field} must be >= 0, got {value}")]
    NegativeBatchField {
        batch_id: BatchId,
        field: &'static str,
        value: Decimal,
    },

    #[error("batch {batch_id}: remaining_volume {remaining} exceeds original_volume {original}")]
    RemainingExceedsOriginal {
        batch_id: BatchId,
        remaining: Decimal,
        original: Decimal,
    },

    #[error("duplicate batch id {batch_id}")]
    DuplicateBatchId { batch_id: BatchId },

    #[error("sale {sale_id}: product_code must not be empty")]
    EmptySaleProduct { sale_id: SaleId },

    #[error("sale {sale_id}: {field} must be >= 0, got {value}")]
    NegativeSaleField {
        sale_id: SaleId,
        field: &'static str,
        value: Decimal,
    },

    #[error("requested volume must be >= 0, got {volume}")]
    NegativeVolume { volume: Decimal },

    #[error("adjustment for {product_code}: {field} must be >= 0, got {value}")]
    NegativeAdjustmentField {
        product_code: String,
        field: &'static str,
        value: Decimal,
    },

    #[error("arithmetic overflow computing {operation} for {record}")]
    ArithmeticOverflow {
        record: OverflowRecord,
        operation: &'static str,
    },
}

impl FifoError {
    pub(crate) fn overflow(record: OverflowRecord, operation: &'static str) -> Self {
        FifoError::ArithmeticOverflow { record, operation }
    }
}

/// The record whose figures overflowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverflowRecord {
    Batch(BatchId),
    Sale(SaleId),
    Product(String),
    /// Cross-product grand totals.
    Totals,
}

impl fmt::Display for OverflowRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowRecord::Batch(id) => write!(f, "batch {id}"),
            OverflowRecord::Sale(id) => write!(f, "sale {id}"),
            OverflowRecord::Product(code) => write!(f, "product {code}"),
            OverflowRecord::Totals => f.write_str("totals"),
        }
    }
}
