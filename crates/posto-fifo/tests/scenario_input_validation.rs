//! Scenario: Input validation faults fail fast
//!
//! # Invariants under test
//!
//! 1. Malformed batches (blank product, negative cost or volume, remaining
//!    above original, duplicate id) are rejected with an error naming the
//!    batch id. No ledger is built.
//!
//! 2. Malformed sales are rejected before the ledger is reset, so a failed
//!    call leaves the previous state intact.
//!
//! 3. A negative requested volume is an error; shortage never is.

use chrono::NaiveDate;
use posto_fifo::{
    allocate_sale, compute_all_products, AllocationMode, BatchLedger, FifoError, PurchaseBatch,
    Sale,
};
use rust_decimal_macros::dec;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
}

#[test]
fn bad_batches_are_named() {
    let cases = vec![
        (
            PurchaseBatch::new(1, " ", day(1), dec!(5), dec!(10)),
            FifoError::EmptyBatchProduct { batch_id: 1 },
        ),
        (
            PurchaseBatch::new(2, "GC", day(1), dec!(-5), dec!(10)),
            FifoError::NegativeBatchField {
                batch_id: 2,
                field: "cost_per_unit",
                value: dec!(-5),
            },
        ),
        (
            PurchaseBatch::new(3, "GC", day(1), dec!(5), dec!(10)).with_remaining(dec!(11)),
            FifoError::RemainingExceedsOriginal {
                batch_id: 3,
                remaining: dec!(11),
                original: dec!(10),
            },
        ),
    ];

    for (batch, expected) in cases {
        assert_eq!(BatchLedger::new(vec![batch], None), Err(expected));
    }
}

#[test]
fn duplicate_batch_id_is_rejected() {
    let err = BatchLedger::new(
        vec![
            PurchaseBatch::new(7, "GC", day(1), dec!(5), dec!(10)),
            PurchaseBatch::new(7, "ET", day(2), dec!(3), dec!(10)),
        ],
        None,
    );
    assert_eq!(err, Err(FifoError::DuplicateBatchId { batch_id: 7 }));
}

#[test]
fn bad_sale_leaves_previous_pass_intact() {
    let mut ledger = BatchLedger::new(
        vec![PurchaseBatch::new(1, "GC", day(1), dec!(5), dec!(100))],
        None,
    )
    .unwrap();
    compute_all_products(&mut ledger, &[Sale::new(1, "GC", day(2), dec!(40), dec!(240))]).unwrap();
    let after_first = ledger.clone();

    let err = compute_all_products(
        &mut ledger,
        &[
            Sale::new(1, "GC", day(2), dec!(40), dec!(240)),
            Sale::new(2, "", day(3), dec!(10), dec!(60)),
        ],
    );
    assert_eq!(err, Err(FifoError::EmptySaleProduct { sale_id: 2 }));
    assert_eq!(ledger, after_first);
}

#[test]
fn negative_request_is_error_but_shortage_is_not() {
    let mut ledger = BatchLedger::new(
        vec![PurchaseBatch::new(1, "GC", day(1), dec!(5), dec!(100))],
        None,
    )
    .unwrap();

    assert!(allocate_sale(&mut ledger, "GC", day(2), dec!(-0.001), AllocationMode::Commit).is_err());
    assert!(allocate_sale(&mut ledger, "GC", day(2), dec!(1000), AllocationMode::Commit).is_ok());
}
