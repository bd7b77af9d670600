//! Scenario: Totals reconcile with per-product summaries
//!
//! # Invariants under test
//!
//! 1. `totals.total_cogs` (and revenue, volume, shortage, sales count) equals
//!    the sum of the per-product values.
//!
//! 2. `totals.margin_percent` is computed from summed profit over summed
//!    revenue, never as an average of per-product percentages.
//!
//! 3. The snapshot basis is explicit: `AsPurchased` shows delivered stock,
//!    `AfterSales` shows what the last pass left.
//!
//! All tests are pure; no IO.

use chrono::NaiveDate;
use posto_fifo::{
    compute_all_products, compute_inventory_snapshot, BatchLedger, PurchaseBatch, Sale,
    SnapshotBasis,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, d).unwrap()
}

fn ledger() -> BatchLedger {
    BatchLedger::new(
        vec![
            PurchaseBatch::new(1, "GC", day(1), dec!(5), dec!(10000)),
            PurchaseBatch::new(2, "ET", day(1), dec!(3), dec!(1000)),
        ],
        None,
    )
    .unwrap()
}

#[test]
fn totals_are_sums_of_products() {
    let mut l = ledger();
    let sales = vec![
        Sale::new(1, "GC", day(2), dec!(1000), dec!(6000)),
        Sale::new(2, "GC", day(3), dec!(500.5), dec!(3003)),
        Sale::new(3, "ET", day(2), dec!(1200), dec!(4800)),
    ];
    let report = compute_all_products(&mut l, &sales).unwrap();

    let sum = |f: fn(&posto_fifo::ProductCostSummary) -> Decimal| -> Decimal {
        report.by_product.values().map(f).sum()
    };
    assert_eq!(report.totals.total_cogs, sum(|s| s.total_cogs));
    assert_eq!(report.totals.total_revenue, sum(|s| s.total_revenue));
    assert_eq!(report.totals.total_volume, sum(|s| s.total_volume));
    assert_eq!(report.totals.volume_shortage, dec!(200));
    assert_eq!(report.totals.sales_count, 3);
}

#[test]
fn total_margin_is_not_an_average() {
    let mut l = ledger();
    // GC: revenue 10000, cogs 5000 → 50%. ET: revenue 100, cogs 90 → 10%.
    let sales = vec![
        Sale::new(1, "GC", day(2), dec!(1000), dec!(10000)),
        Sale::new(2, "ET", day(2), dec!(30), dec!(100)),
    ];
    let report = compute_all_products(&mut l, &sales).unwrap();

    assert_eq!(report.by_product["GC"].margin_percent, dec!(50));
    assert_eq!(report.by_product["ET"].margin_percent, dec!(10));

    // 5010 / 10100, not (50 + 10) / 2
    let expected = dec!(5010) / dec!(10100) * dec!(100);
    assert_eq!(report.totals.margin_percent, expected);
    assert_ne!(report.totals.margin_percent, dec!(30));
}

#[test]
fn snapshot_basis_is_explicit() {
    let mut l = ledger();
    let sales = vec![
        Sale::new(1, "GC", day(2), dec!(4000), dec!(24000)),
        Sale::new(2, "ET", day(2), dec!(1000), dec!(4000)),
    ];
    compute_all_products(&mut l, &sales).unwrap();

    let after = compute_inventory_snapshot(&mut l, SnapshotBasis::AfterSales).unwrap();
    assert_eq!(after["GC"].total_remaining_volume, dec!(6000));
    assert_eq!(after["GC"].total_remaining_value, dec!(30000));
    assert!(!after.contains_key("ET"));

    let purchased = compute_inventory_snapshot(&mut l, SnapshotBasis::AsPurchased).unwrap();
    assert_eq!(purchased["GC"].total_remaining_volume, dec!(10000));
    assert_eq!(purchased["ET"].total_remaining_volume, dec!(1000));
    assert_eq!(purchased["ET"].avg_cost_per_unit, dec!(3));
}
