use rust_decimal::Decimal;

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// `numerator / denominator`, or zero when the denominator is zero.
///
/// Every per-unit figure in the engine goes through here so that an empty
/// product never yields a division error. `None` means the quotient left the
/// `Decimal` range.
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        Some(Decimal::ZERO)
    } else {
        numerator.checked_div(denominator)
    }
}

/// `part / whole * 100`, or zero when `whole` is zero.
pub fn percent_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
    ratio(part, whole)?.checked_mul(ONE_HUNDRED)
}

/// Gross margin as a percentage of revenue.
///
/// Always computed from summed profit and summed revenue; averaging
/// per-product percentages would weight small products like large ones.
pub fn margin_percent(gross_profit: Decimal, revenue: Decimal) -> Option<Decimal> {
    percent_of(gross_profit, revenue)
}

/// Residual allowed by conservation checks (1e-9).
///
/// Add/sub/mul on `Decimal` are exact, so this only absorbs rounding from
/// inputs that were themselves produced by division upstream.
pub fn conservation_tolerance() -> Decimal {
    Decimal::new(1, 9)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn ratio_guards_zero_denominator() {
        assert_eq!(ratio(dec!(10), Decimal::ZERO), Some(Decimal::ZERO));
        assert_eq!(ratio(dec!(10), dec!(4)), Some(dec!(2.5)));
    }

    #[test]
    fn margin_percent_of_zero_revenue_is_zero() {
        assert_eq!(margin_percent(dec!(-50), Decimal::ZERO), Some(Decimal::ZERO));
    }

    #[test]
    fn margin_percent_basic() {
        // profit 25 on revenue 100 = 25%
        assert_eq!(margin_percent(dec!(25), dec!(100)), Some(dec!(25)));
    }

    #[test]
    fn out_of_range_quotient_is_none() {
        assert_eq!(ratio(Decimal::MAX, dec!(0.5)), None);
        assert_eq!(percent_of(Decimal::MAX, dec!(2)), None);
    }
}
