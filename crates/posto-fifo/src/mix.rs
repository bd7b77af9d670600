//! Sales mix: share of each product in total volume, plus the two composite
//! ratios the dashboard tracks (premium gasoline, S10 diesel).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    error::{FifoError, OverflowRecord},
    metrics::percent_of,
    types::Sale,
};

/// A premium product and the standard product it competes with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantPair {
    pub premium: String,
    pub standard: String,
}

impl VariantPair {
    pub fn new<P: Into<String>, S: Into<String>>(premium: P, standard: S) -> Self {
        Self {
            premium: premium.into(),
            standard: standard.into(),
        }
    }

    /// Premium volume as a percentage of the pair's combined volume.
    fn premium_share(&self, volumes: &BTreeMap<String, Decimal>) -> Result<Decimal, FifoError> {
        let premium = volume_of(volumes, &self.premium);
        let standard = volume_of(volumes, &self.standard);
        premium
            .checked_add(standard)
            .and_then(|pair_total| percent_of(premium, pair_total))
            .ok_or_else(|| {
                FifoError::overflow(OverflowRecord::Product(self.premium.clone()), "pair share")
            })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixPairs {
    pub gasoline: VariantPair,
    pub diesel: VariantPair,
}

impl Default for MixPairs {
    /// Additivated vs common gasoline, S10 vs S500 diesel.
    fn default() -> Self {
        Self {
            gasoline: VariantPair::new("GA", "GC"),
            diesel: VariantPair::new("DS10", "DS500"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMix {
    pub total_volume: Decimal,
    /// Percent of `total_volume`, per product.
    pub shares: BTreeMap<String, Decimal>,
    pub premium_gasoline_share: Decimal,
    pub s10_diesel_share: Decimal,
}

/// Compute the mix from a product → volume map. Zero totals give zero shares.
pub fn compute_mix(
    volumes: &BTreeMap<String, Decimal>,
    pairs: &MixPairs,
) -> Result<ProductMix, FifoError> {
    let total_volume = volumes
        .values()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
        .ok_or_else(|| FifoError::overflow(OverflowRecord::Totals, "total volume"))?;
    let shares = volumes
        .iter()
        .map(|(code, v)| {
            percent_of(*v, total_volume)
                .map(|share| (code.clone(), share))
                .ok_or_else(|| FifoError::overflow(OverflowRecord::Product(code.clone()), "share"))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    Ok(ProductMix {
        total_volume,
        shares,
        premium_gasoline_share: pairs.gasoline.premium_share(volumes)?,
        s10_diesel_share: pairs.diesel.premium_share(volumes)?,
    })
}

/// Sum `volume_sold` per product.
pub fn volumes_by_product(sales: &[Sale]) -> Result<BTreeMap<String, Decimal>, FifoError> {
    let mut out: BTreeMap<String, Decimal> = BTreeMap::new();
    for sale in sales {
        let volume = out.entry(sale.product_code.clone()).or_default();
        *volume = volume
            .checked_add(sale.volume_sold)
            .ok_or_else(|| FifoError::overflow(OverflowRecord::Sale(sale.id), "product volume"))?;
    }
    Ok(out)
}

fn volume_of(volumes: &BTreeMap<String, Decimal>, code: &str) -> Decimal {
    volumes.get(code).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn vols(pairs: &[(&str, Decimal)]) -> BTreeMap<String, Decimal> {
        pairs.iter().map(|(c, v)| (c.to_string(), *v)).collect()
    }

    #[test]
    fn shares_and_composites() {
        let m = compute_mix(
            &vols(&[
                ("GA", dec!(300)),
                ("GC", dec!(700)),
                ("DS10", dec!(600)),
                ("DS500", dec!(200)),
                ("ET", dec!(200)),
            ]),
            &MixPairs::default(),
        )
        .unwrap();
        assert_eq!(m.total_volume, dec!(2000));
        assert_eq!(m.shares["GC"], dec!(35));
        assert_eq!(m.shares["ET"], dec!(10));
        assert_eq!(m.premium_gasoline_share, dec!(30));
        assert_eq!(m.s10_diesel_share, dec!(75));
    }

    #[test]
    fn zero_total_gives_zeroed_output() {
        let m = compute_mix(&vols(&[("GA", dec!(0)), ("GC", dec!(0))]), &MixPairs::default())
            .unwrap();
        assert_eq!(m.total_volume, Decimal::ZERO);
        assert_eq!(m.shares["GA"], Decimal::ZERO);
        assert_eq!(m.premium_gasoline_share, Decimal::ZERO);
        assert_eq!(m.s10_diesel_share, Decimal::ZERO);
    }

    #[test]
    fn missing_pair_member_counts_as_zero() {
        let m = compute_mix(&vols(&[("GA", dec!(50))]), &MixPairs::default()).unwrap();
        assert_eq!(m.premium_gasoline_share, dec!(100));
        assert_eq!(m.s10_diesel_share, Decimal::ZERO);
    }

    #[test]
    fn custom_pairs() {
        let pairs = MixPairs {
            gasoline: VariantPair::new("GP", "GC"),
            ..MixPairs::default()
        };
        let m = compute_mix(&vols(&[("GP", dec!(1)), ("GC", dec!(3))]), &pairs).unwrap();
        assert_eq!(m.premium_gasoline_share, dec!(25));
    }

    #[test]
    fn volumes_are_summed_per_product() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let v = volumes_by_product(&[
            Sale::new(1, "GC", d, dec!(10), dec!(60)),
            Sale::new(2, "GC", d, dec!(5.5), dec!(33)),
            Sale::new(3, "ET", d, dec!(2), dec!(8)),
        ])
        .unwrap();
        assert_eq!(v["GC"], dec!(15.5));
        assert_eq!(v["ET"], dec!(2));
    }

    #[test]
    fn volume_overflow_names_the_sale() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let err = volumes_by_product(&[
            Sale::new(1, "GC", d, Decimal::MAX, dec!(1)),
            Sale::new(2, "GC", d, Decimal::MAX, dec!(1)),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            FifoError::ArithmeticOverflow {
                record: OverflowRecord::Sale(2),
                operation: "product volume",
            }
        );
    }
}
