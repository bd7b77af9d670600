use assert_cmd::prelude::*;
use predicates::prelude::*;
use rust_decimal::Decimal;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::str::FromStr;
use tempfile::TempDir;

/// `posto` costing commands print one JSON document on stdout, driven by CSV
/// inputs and optional layered config.
///
/// Reference data: 100 L @ 2.00 on 2025-01-01 and 100 L @ 3.00 on 2025-01-05;
/// one sale of 150 L on 2025-01-10 costs 350.

const PURCHASES: &str = "\
id,product_code,purchase_date,cost_per_unit,original_volume,remaining_volume,invoice_reference
1,GC,2025-01-01,2.00,100,100,NF-1
2,GC,2025-01-05,3.00,100,100,NF-2
3,GA,2024-12-15,2.50,100,100,NF-0
";

const SALES: &str = "\
id,product_code,sale_date,volume_sold,total_revenue
1,GC,2025-01-10,150,900
";

struct Fixture {
    _dir: TempDir,
    purchases: PathBuf,
    sales: PathBuf,
    dir: PathBuf,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let purchases = dir.path().join("purchases.csv");
    let sales = dir.path().join("sales.csv");
    fs::write(&purchases, PURCHASES).unwrap();
    fs::write(&sales, SALES).unwrap();
    Fixture {
        dir: dir.path().to_path_buf(),
        _dir: dir,
        purchases,
        sales,
    }
}

fn run_json(args: &[&str]) -> Value {
    let out = Command::cargo_bin("posto").unwrap().args(args).output().unwrap();
    assert!(
        out.status.success(),
        "posto {:?} failed: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("stdout must be a single JSON document")
}

fn dec_at(v: &Value, pointer: &str) -> Decimal {
    let raw = v
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_else(|| panic!("missing decimal at {pointer}: {v}"));
    Decimal::from_str(raw).unwrap()
}

#[test]
fn report_costs_oldest_batch_first() {
    let f = fixture();
    let v = run_json(&[
        "report",
        "--purchases",
        f.purchases.to_str().unwrap(),
        "--sales",
        f.sales.to_str().unwrap(),
    ]);

    assert_eq!(v["command"], "report");
    assert_eq!(dec_at(&v, "/result/totals/total_cogs"), Decimal::from(350));
    assert_eq!(dec_at(&v, "/result/by_product/GC/gross_profit"), Decimal::from(550));
    assert_eq!(dec_at(&v, "/result/sales/0/volume_shortage"), Decimal::ZERO);
}

#[test]
fn preview_after_sales_does_not_double_count() {
    let f = fixture();
    let v = run_json(&[
        "preview",
        "--purchases",
        f.purchases.to_str().unwrap(),
        "--sales",
        f.sales.to_str().unwrap(),
        "--code",
        "GC",
        "--date",
        "2025-01-11",
        "--volume",
        "80",
    ]);

    // Only 50 L left after the recorded sale.
    assert_eq!(dec_at(&v, "/result/cost/total_cogs"), Decimal::from(150));
    assert_eq!(dec_at(&v, "/result/cost/volume_shortage"), Decimal::from(30));
    assert_eq!(v["result"]["after_sales"], true);
}

#[test]
fn start_date_flag_overrides_config() {
    let f = fixture();
    let config = f.dir.join("station.yaml");
    fs::write(&config, "fifo:\n  start_date: \"2025-01-03\"\n").unwrap();

    // Config alone excludes the Jan 1 batch: 100 @ 3.00, 50 short.
    let from_config = run_json(&[
        "report",
        "--purchases",
        f.purchases.to_str().unwrap(),
        "--sales",
        f.sales.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert_eq!(dec_at(&from_config, "/result/totals/total_cogs"), Decimal::from(300));
    assert_eq!(dec_at(&from_config, "/result/totals/volume_shortage"), Decimal::from(50));
    assert_eq!(from_config["result"]["fifo_start_date"], "2025-01-03");

    let from_flag = run_json(&[
        "report",
        "--purchases",
        f.purchases.to_str().unwrap(),
        "--sales",
        f.sales.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--start-date",
        "2025-01-01",
    ]);
    assert_eq!(dec_at(&from_flag, "/result/totals/total_cogs"), Decimal::from(350));
}

#[test]
fn snapshot_bases() {
    let f = fixture();
    let after = run_json(&[
        "snapshot",
        "--purchases",
        f.purchases.to_str().unwrap(),
        "--sales",
        f.sales.to_str().unwrap(),
    ]);
    assert_eq!(after["result"]["basis"], "after_sales");
    assert_eq!(
        dec_at(&after, "/result/by_product/GC/total_remaining_volume"),
        Decimal::from(50)
    );

    let purchased = run_json(&[
        "snapshot",
        "--purchases",
        f.purchases.to_str().unwrap(),
        "--basis",
        "as-purchased",
    ]);
    assert_eq!(
        dec_at(&purchased, "/result/by_product/GC/total_remaining_value"),
        Decimal::from(500)
    );
    assert_eq!(purchased["result"]["by_product"]["GC"]["batch_count"], 2);
}

#[test]
fn after_sales_snapshot_requires_sales() {
    let f = fixture();
    Command::cargo_bin("posto")
        .unwrap()
        .args(["snapshot", "--purchases", f.purchases.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--sales"));
}

#[test]
fn malformed_csv_fails_with_line_number() {
    let f = fixture();
    let bad = f.dir.join("bad_sales.csv");
    fs::write(
        &bad,
        "id,product_code,sale_date,volume_sold,total_revenue\n1,GC,10/01/2025,150,900\n",
    )
    .unwrap();

    Command::cargo_bin("posto")
        .unwrap()
        .args([
            "report",
            "--purchases",
            f.purchases.to_str().unwrap(),
            "--sales",
            bad.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}
