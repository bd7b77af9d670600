use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    error::{FifoError, OverflowRecord},
    metrics::margin_percent,
    types::ProductCostSummary,
};

/// Tank measurement result recorded outside of sales and purchases.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    Loss,
    Gain,
}

/// An inventory loss (evaporation, leak, measurement gap) or gain.
///
/// Only losses carry a cost; gains are tracked by volume.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryAdjustment {
    pub product_code: String,
    pub kind: AdjustmentKind,
    pub volume: Decimal,
    #[serde(default)]
    pub total_cost: Decimal,
}

/// Loss and gain totals of one product.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentTotals {
    pub loss_volume: Decimal,
    pub loss_cost: Decimal,
    pub gain_volume: Decimal,
}

impl AdjustmentTotals {
    /// Field-wise sum; `None` on overflow.
    pub fn combine(&self, other: &Self) -> Option<Self> {
        Some(Self {
            loss_volume: self.loss_volume.checked_add(other.loss_volume)?,
            loss_cost: self.loss_cost.checked_add(other.loss_cost)?,
            gain_volume: self.gain_volume.checked_add(other.gain_volume)?,
        })
    }
}

/// Profit after inventory losses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustedResult {
    pub loss_volume: Decimal,
    pub loss_cost: Decimal,
    pub gain_volume: Decimal,
    pub adjusted_profit: Decimal,
    pub adjusted_margin_percent: Decimal,
}

/// Group adjustments by product.
///
/// # Errors
/// [`FifoError::NegativeAdjustmentField`] for a negative volume or cost,
/// [`FifoError::ArithmeticOverflow`] if a product's totals overflow.
pub fn summarize_adjustments(
    adjustments: &[InventoryAdjustment],
) -> Result<BTreeMap<String, AdjustmentTotals>, FifoError> {
    let mut out: BTreeMap<String, AdjustmentTotals> = BTreeMap::new();
    for adj in adjustments {
        for (field, value) in [("volume", adj.volume), ("total_cost", adj.total_cost)] {
            if value < Decimal::ZERO {
                return Err(FifoError::NegativeAdjustmentField {
                    product_code: adj.product_code.clone(),
                    field,
                    value,
                });
            }
        }

        let this = match adj.kind {
            AdjustmentKind::Loss => AdjustmentTotals {
                loss_volume: adj.volume,
                loss_cost: adj.total_cost,
                gain_volume: Decimal::ZERO,
            },
            AdjustmentKind::Gain => AdjustmentTotals {
                gain_volume: adj.volume,
                ..AdjustmentTotals::default()
            },
        };
        let totals = out.entry(adj.product_code.clone()).or_default();
        *totals = totals.combine(&this).ok_or_else(|| {
            FifoError::overflow(
                OverflowRecord::Product(adj.product_code.clone()),
                "adjustment totals",
            )
        })?;
    }
    Ok(out)
}

/// `adjusted_profit = gross_profit - loss_cost`, margin over the same revenue.
///
/// `None` when the adjusted figures leave the `Decimal` range.
pub fn adjust_summary(
    summary: &ProductCostSummary,
    totals: &AdjustmentTotals,
) -> Option<AdjustedResult> {
    let adjusted_profit = summary.gross_profit.checked_sub(totals.loss_cost)?;
    Some(AdjustedResult {
        loss_volume: totals.loss_volume,
        loss_cost: totals.loss_cost,
        gain_volume: totals.gain_volume,
        adjusted_profit,
        adjusted_margin_percent: margin_percent(adjusted_profit, summary.total_revenue)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn adj(code: &str, kind: AdjustmentKind, volume: Decimal, cost: Decimal) -> InventoryAdjustment {
        InventoryAdjustment {
            product_code: code.to_string(),
            kind,
            volume,
            total_cost: cost,
        }
    }

    #[test]
    fn losses_and_gains_are_grouped_per_product() {
        let totals = summarize_adjustments(&[
            adj("GC", AdjustmentKind::Loss, dec!(12), dec!(66)),
            adj("GC", AdjustmentKind::Loss, dec!(3), dec!(16.5)),
            adj("GC", AdjustmentKind::Gain, dec!(4), dec!(0)),
            adj("ET", AdjustmentKind::Gain, dec!(7), dec!(0)),
        ])
        .unwrap();

        let gc = &totals["GC"];
        assert_eq!(gc.loss_volume, dec!(15));
        assert_eq!(gc.loss_cost, dec!(82.5));
        assert_eq!(gc.gain_volume, dec!(4));
        assert_eq!(totals["ET"].loss_cost, Decimal::ZERO);
    }

    #[test]
    fn adjusted_profit_subtracts_loss_cost() {
        let summary = ProductCostSummary::from_totals(
            1,
            dec!(100),
            dec!(100),
            dec!(600),
            dec!(500),
            Decimal::ZERO,
        )
        .unwrap();
        let totals = AdjustmentTotals {
            loss_volume: dec!(5),
            loss_cost: dec!(25),
            gain_volume: Decimal::ZERO,
        };
        let r = adjust_summary(&summary, &totals).unwrap();
        assert_eq!(r.adjusted_profit, dec!(75));
        assert_eq!(r.adjusted_margin_percent, dec!(12.5));
    }

    #[test]
    fn rejects_negative_loss_volume() {
        let err = summarize_adjustments(&[adj("DS10", AdjustmentKind::Loss, dec!(-1), dec!(0))]);
        assert_eq!(
            err,
            Err(FifoError::NegativeAdjustmentField {
                product_code: "DS10".to_string(),
                field: "volume",
                value: dec!(-1),
            })
        );
    }
}
