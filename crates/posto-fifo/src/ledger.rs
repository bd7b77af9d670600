//! Batch ledger: owns all purchase-batch state for one costing pass.
//!
//! # Purpose
//! The ledger keeps two lists:
//!
//! - `source`: the validated, start-date-filtered, FIFO-sorted batches as
//!   supplied. Never mutated after construction.
//! - `working`: the batches the allocator draws from. Re-derived from
//!   `source` on [`BatchLedger::reset`].
//!
//! Mutation goes through `&mut BatchLedger` only, so two computations can
//! never alias one ledger. Callers that want concurrent computations clone
//! the ledger (or build one per computation).
//!
//! # Invariants
//! - `0 <= remaining_volume <= original_volume` for every batch, always.
//! - `working[i].remaining_volume <= source[i].remaining_volume`.
//! - `working` and `source` have the same batches in the same order.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::{error::FifoError, ordering::sort_batches_fifo, types::PurchaseBatch};

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchLedger {
    source: Vec<PurchaseBatch>,
    working: Vec<PurchaseBatch>,
    start_date: Option<NaiveDate>,
    excluded_before_start: usize,
}

impl BatchLedger {
    /// Build the ledger from raw purchase batches.
    ///
    /// Batches dated before `start_date` do not participate in costing (that
    /// inventory is treated as not owned). Every record is validated, including
    /// the excluded ones.
    ///
    /// # Errors
    /// Returns [`FifoError`] naming the first offending batch. Nothing is
    /// built on error.
    pub fn new(
        batches: Vec<PurchaseBatch>,
        start_date: Option<NaiveDate>,
    ) -> Result<Self, FifoError> {
        let mut seen: BTreeSet<i64> = BTreeSet::new();
        let mut source: Vec<PurchaseBatch> = Vec::with_capacity(batches.len());
        let mut excluded_before_start = 0usize;

        for batch in batches {
            validate_batch(&batch)?;
            if !seen.insert(batch.id) {
                return Err(FifoError::DuplicateBatchId { batch_id: batch.id });
            }
            if start_date.is_some_and(|start| batch.purchase_date < start) {
                excluded_before_start += 1;
                continue;
            }
            source.push(batch);
        }

        sort_batches_fifo(&mut source);

        debug!(
            batches = source.len(),
            excluded_before_start,
            start_date = ?start_date,
            "batch ledger constructed"
        );

        Ok(Self {
            working: source.clone(),
            source,
            start_date,
            excluded_before_start,
        })
    }

    // -----------------------------------------------------------------------
    // Write surface
    // -----------------------------------------------------------------------

    /// Restore every batch to its starting remaining volume.
    ///
    /// Required before a fresh pass: a previous pass may have consumed volume.
    pub fn reset(&mut self) {
        self.working = self.source.clone();
    }

    /// Restore only the batches of one product.
    ///
    /// Products never share batches, so this gives the product the same
    /// starting state as a full [`reset`](Self::reset) while leaving the
    /// consumption already recorded for other products in place.
    pub fn reset_product(&mut self, product_code: &str) {
        for (work, src) in self.working.iter_mut().zip(self.source.iter()) {
            if src.product_code == product_code {
                work.remaining_volume = src.remaining_volume;
            }
        }
    }

    /// Draw `volume` from the working batch at `index`.
    ///
    /// Only the allocator calls this, with a volume it computed as
    /// `min(requested, remaining)`; the clamp keeps the invariant even so.
    pub(crate) fn consume(&mut self, index: usize, volume: Decimal) {
        if let Some(batch) = self.working.get_mut(index) {
            debug_assert!(volume >= Decimal::ZERO);
            debug_assert!(volume <= batch.remaining_volume);
            let take = volume.min(batch.remaining_volume).max(Decimal::ZERO);
            batch.remaining_volume -= take;
        }
    }

    // -----------------------------------------------------------------------
    // Read surface
    // -----------------------------------------------------------------------

    /// Live batches of `product_code` purchased on or before `as_of`, in
    /// ledger order. A sale can never draw from a later delivery.
    pub fn available_batches(&self, product_code: &str, as_of: NaiveDate) -> Vec<&PurchaseBatch> {
        self.available(product_code, as_of)
            .into_iter()
            .map(|(_, b)| b)
            .collect()
    }

    /// Same filter as [`available_batches`](Self::available_batches), with
    /// working-list indices for the allocator.
    pub(crate) fn available(
        &self,
        product_code: &str,
        as_of: NaiveDate,
    ) -> Vec<(usize, &PurchaseBatch)> {
        self.working
            .iter()
            .enumerate()
            .filter(|(_, b)| {
                b.product_code == product_code && b.is_live() && b.purchase_date <= as_of
            })
            .collect()
    }

    /// Working batches in ledger order (current remaining volumes).
    pub fn batches(&self) -> &[PurchaseBatch] {
        &self.working
    }

    /// Batches as supplied (starting remaining volumes), in ledger order.
    pub fn source_batches(&self) -> &[PurchaseBatch] {
        &self.source
    }

    pub fn batch(&self, id: i64) -> Option<&PurchaseBatch> {
        self.working.iter().find(|b| b.id == id)
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    /// Number of supplied batches dropped because they predate the start date.
    pub fn excluded_before_start(&self) -> usize {
        self.excluded_before_start
    }

    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    /// Distinct product codes held in the ledger (sorted).
    pub fn product_codes(&self) -> BTreeSet<String> {
        self.working.iter().map(|b| b.product_code.clone()).collect()
    }

    /// Current remaining volume per product (including products at zero),
    /// saturating at `Decimal::MAX`.
    pub fn remaining_by_product(&self) -> BTreeMap<String, Decimal> {
        let mut out: BTreeMap<String, Decimal> = BTreeMap::new();
        for b in &self.working {
            let total = out.entry(b.product_code.clone()).or_insert(Decimal::ZERO);
            *total = total.saturating_add(b.remaining_volume);
        }
        out
    }

    /// Check the depletion invariants against the source list.
    ///
    /// O(n); for tests, audits, and debug assertions.
    pub fn verify_integrity(&self) -> bool {
        self.working.len() == self.source.len()
            && self.working.iter().zip(self.source.iter()).all(|(w, s)| {
                w.id == s.id
                    && w.remaining_volume >= Decimal::ZERO
                    && w.remaining_volume <= w.original_volume
                    && w.remaining_volume <= s.remaining_volume
            })
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_batch(batch: &PurchaseBatch) -> Result<(), FifoError> {
    if batch.product_code.trim().is_empty() {
        return Err(FifoError::EmptyBatchProduct { batch_id: batch.id });
    }
    let non_negative = [
        ("cost_per_unit", batch.cost_per_unit),
        ("original_volume", batch.original_volume),
        ("remaining_volume", batch.remaining_volume),
    ];
    for (field, value) in non_negative {
        if value < Decimal::ZERO {
            return Err(FifoError::NegativeBatchField {
                batch_id: batch.id,
                field,
                value,
            });
        }
    }
    if batch.remaining_volume > batch.original_volume {
        return Err(FifoError::RemainingExceedsOriginal {
            batch_id: batch.id,
            remaining: batch.remaining_volume,
            original: batch.original_volume,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
