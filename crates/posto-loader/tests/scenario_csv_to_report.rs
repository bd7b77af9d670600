//! Scenario: CSV files on disk drive a full FIFO report
//!
//! # Invariants under test
//!
//! 1. Purchases, sales and adjustments load from files with their own
//!    column order and feed the engine unchanged.
//!
//! 2. Input row order does not matter: the engine sorts by `(date, id)`.
//!
//! 3. A malformed file fails with the line number, never a partial load.

use std::io::Write;

use posto_fifo::{compute_fifo_report, BatchLedger};
use posto_loader::{load_adjustments_csv, load_purchases_csv, load_sales_csv, LoadError};
use rust_decimal_macros::dec;
use tempfile::NamedTempFile;

fn write_tmp(content: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

#[test]
fn files_load_and_reconcile() {
    let purchases = write_tmp(
        "\
invoice_reference,id,product_code,purchase_date,cost_per_unit,original_volume,remaining_volume
NF-2,2,GC,2025-01-05,3.00,100,100
NF-1,1,GC,2025-01-01,2.00,100,100
",
    );
    let sales = write_tmp(
        "\
id,product_code,sale_date,volume_sold,total_revenue
11,GC,2025-01-10,150,900
",
    );
    let adjustments = write_tmp(
        "\
product_code,kind,volume,total_cost
GC,loss,5,15
",
    );

    let batches = load_purchases_csv(purchases.path()).unwrap();
    let sales = load_sales_csv(sales.path()).unwrap();
    let adjustments = load_adjustments_csv(adjustments.path()).unwrap();

    let mut ledger = BatchLedger::new(batches, None).unwrap();
    let report = compute_fifo_report(&mut ledger, &sales, &adjustments).unwrap();

    assert_eq!(report.totals.total_cogs, dec!(350));
    assert_eq!(report.totals.gross_profit, dec!(550));
    assert_eq!(report.adjusted_totals.adjusted_profit, dec!(535));
    assert_eq!(ledger.batch(2).unwrap().remaining_volume, dec!(50));
}

#[test]
fn missing_file_is_io_error() {
    let err = load_sales_csv("/definitely/not/here.csv").unwrap_err();
    assert!(matches!(err, LoadError::Io(_)));
}

#[test]
fn malformed_row_names_line() {
    let purchases = write_tmp(
        "\
id,product_code,purchase_date,cost_per_unit,original_volume,remaining_volume
1,GC,2025-01-01,2.00,100,100
2,GC,2025-01-05,abc,100,100
",
    );
    let err = load_purchases_csv(purchases.path()).unwrap_err();
    assert_eq!(
        err,
        LoadError::BadNumber {
            line: 3,
            column: "cost_per_unit",
            value: "abc".to_string(),
        }
    );
    assert!(err.to_string().contains("line 3"));
}
