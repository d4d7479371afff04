//! Pricing
//!
//! Prices are whole currency units. A discounted unit price is rounded once,
//! half away from zero, and every total is built from that rounded figure.

use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{discounts::DiscountPercent, variants::Variant};

/// Errors that can occur while pricing a line.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// Multiplying a price overflowed the decimal range.
    #[error("price arithmetic overflowed")]
    Overflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Per-unit price after applying `discount` to `base`.
///
/// Computed as `round(base × (1 − discount / 100))`, rounding to the nearest
/// whole unit with halves rounded away from zero. A zero discount returns
/// `base` untouched.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the discount cannot be applied within
/// the decimal range.
pub fn unit_price<'a>(
    base: Money<'a, Currency>,
    discount: DiscountPercent,
) -> Result<Money<'a, Currency>, PricingError> {
    if discount.is_zero() {
        return Ok(base);
    }

    let amount = *base.amount();
    let reduction = discount.fraction() * amount;

    let discounted = amount
        .checked_sub(reduction)
        .ok_or(PricingError::Overflow)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    Ok(Money::from_decimal(discounted, base.currency()))
}

/// Total for `quantity` units at `unit_price`. No further rounding happens.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the product does not fit a decimal.
pub fn line_total<'a>(
    unit_price: Money<'a, Currency>,
    quantity: u32,
) -> Result<Money<'a, Currency>, PricingError> {
    let total = unit_price
        .amount()
        .checked_mul(Decimal::from(quantity))
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_decimal(total, unit_price.currency()))
}

/// Price preview for a variant before it is added to the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote<'a> {
    /// Discounted per-unit price.
    pub unit_price: Money<'a, Currency>,

    /// Discounted price for the whole variant quantity.
    pub total: Money<'a, Currency>,

    /// Undiscounted price for the whole variant quantity.
    pub original_total: Money<'a, Currency>,

    /// Discount that was applied.
    pub discount: DiscountPercent,
}

impl Quote<'_> {
    /// Whether the quote is cheaper than paying full price.
    pub fn is_discounted(&self) -> bool {
        self.total.amount() < self.original_total.amount()
    }
}

/// Price a variant of a product whose full unit price is `base`.
///
/// # Errors
///
/// Returns a [`PricingError`] if any of the price arithmetic overflows.
pub fn quote<'a>(base: Money<'a, Currency>, variant: &Variant) -> Result<Quote<'a>, PricingError> {
    let unit = unit_price(base, variant.discount())?;

    Ok(Quote {
        unit_price: unit,
        total: line_total(unit, variant.quantity())?,
        original_total: line_total(base, variant.quantity())?,
        discount: variant.discount(),
    })
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::INR;
    use testresult::TestResult;

    use crate::discounts::BulkDiscount;

    use super::*;

    fn rupees(amount: i64) -> Money<'static, Currency> {
        Money::from_major(amount, INR)
    }

    #[test]
    fn unit_price_without_discount() -> TestResult {
        assert_eq!(unit_price(rupees(100), DiscountPercent::ZERO)?, rupees(100));

        Ok(())
    }

    #[test]
    fn unit_price_with_discount() -> TestResult {
        assert_eq!(unit_price(rupees(100), DiscountPercent::from(10))?, rupees(90));
        assert_eq!(unit_price(rupees(100), DiscountPercent::from(5))?, rupees(95));

        Ok(())
    }

    #[test]
    fn unit_price_rounds_half_up() -> TestResult {
        // 99 × 0.5 = 49.5
        assert_eq!(unit_price(rupees(99), DiscountPercent::from(50))?, rupees(50));
        // 99 × 0.9 = 89.1
        assert_eq!(unit_price(rupees(99), DiscountPercent::from(10))?, rupees(89));
        // 99 × 0.85 = 84.15
        assert_eq!(unit_price(rupees(99), DiscountPercent::from(15))?, rupees(84));

        Ok(())
    }

    #[test]
    fn unit_price_full_discount_is_free() -> TestResult {
        assert_eq!(unit_price(rupees(250), DiscountPercent::from(100))?, rupees(0));

        Ok(())
    }

    #[test]
    fn line_total_multiplies_rounded_unit() -> TestResult {
        let unit = unit_price(rupees(99), DiscountPercent::from(50))?;

        assert_eq!(line_total(unit, 3)?, rupees(150));
        assert_eq!(line_total(rupees(95), 10)?, rupees(950));

        Ok(())
    }

    #[test]
    fn quote_for_bulk_variant() -> TestResult {
        let variant = Variant::bulk(&BulkDiscount::new(10, 5))?;
        let quote = quote(rupees(100), &variant)?;

        assert_eq!(quote.unit_price, rupees(95));
        assert_eq!(quote.total, rupees(950));
        assert_eq!(quote.original_total, rupees(1000));
        assert!(quote.is_discounted());

        Ok(())
    }

    #[test]
    fn quote_for_single_variant() -> TestResult {
        let quote = quote(rupees(100), &Variant::single())?;

        assert_eq!(quote.total, rupees(100));
        assert!(!quote.is_discounted());

        Ok(())
    }
}
