//! FIFO ordering policy.
//!
//! Batches and sales are both ordered by `(date, id)` ascending. Date is the
//! FIFO key; id is the deterministic tie-break for same-day records. Ids are
//! unique within each list, so the order is total and never depends on the
//! order rows arrived from the data layer.
//!
//! Costing is order-sensitive: feeding the same sales in another order moves
//! volume between batches of different cost, so every pass sorts first.

use std::cmp::Ordering;

use crate::types::{PurchaseBatch, Sale};

/// Canonical batch comparison: `(purchase_date, id)` ascending.
pub fn batch_fifo_order(a: &PurchaseBatch, b: &PurchaseBatch) -> Ordering {
    a.purchase_date
        .cmp(&b.purchase_date)
        .then_with(|| a.id.cmp(&b.id))
}

/// Canonical sale comparison: `(sale_date, id)` ascending.
pub fn sale_fifo_order(a: &Sale, b: &Sale) -> Ordering {
    a.sale_date.cmp(&b.sale_date).then_with(|| a.id.cmp(&b.id))
}

/// Sort batches into ledger order **in place**.
pub fn sort_batches_fifo(batches: &mut [PurchaseBatch]) {
    batches.sort_by(batch_fifo_order);
}

/// Sort sales into depletion order **in place**.
pub fn sort_sales_fifo(sales: &mut [Sale]) {
    sales.sort_by(sale_fifo_order);
}

/// Sales of one product, borrowed, in depletion order.
pub(crate) fn product_sales_in_order<'a>(sales: &'a [Sale], product_code: &str) -> Vec<&'a Sale> {
    let mut out: Vec<&Sale> = sales
        .iter()
        .filter(|s| s.product_code == product_code)
        .collect();
    out.sort_by(|a, b| sale_fifo_order(a, b));
    out
}
