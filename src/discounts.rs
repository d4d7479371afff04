//! Discounts
//!
//! Bulk-discount tiers as authored in the admin console: buy exactly `quantity`
//! units and each unit is discounted by `discount` percent.
//!
//! The admin form posts tier fields as strings, so both numbers and numeric
//! strings are accepted.

use std::fmt;

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, de};

/// A discount expressed in percent points (`5` means 5% off).
///
/// Values outside `0..=100` can be constructed; [`BulkDiscount::is_valid`]
/// is what the catalogue checks tiers with.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DiscountPercent(Decimal);

impl DiscountPercent {
    /// No discount.
    pub const ZERO: DiscountPercent = DiscountPercent(Decimal::ZERO);

    /// Create a discount from percent points.
    pub fn new(points: impl Into<Decimal>) -> Self {
        DiscountPercent(points.into())
    }

    /// Percent points (`5` for 5%).
    pub fn points(&self) -> Decimal {
        self.0
    }

    /// Whether this is a zero discount.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whether the discount lies within `0..=100` percent.
    pub fn is_valid(&self) -> bool {
        !self.0.is_sign_negative() && self.0 <= Decimal::ONE_HUNDRED
    }

    /// The discount as a fraction of the price (`0.05` for 5%).
    pub fn fraction(&self) -> Percentage {
        Percentage::from(self.0 / Decimal::ONE_HUNDRED)
    }
}

impl fmt::Display for DiscountPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

impl From<u32> for DiscountPercent {
    fn from(points: u32) -> Self {
        DiscountPercent(Decimal::from(points))
    }
}

/// A single bulk-discount tier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDiscount {
    /// Exact quantity the tier applies to.
    #[serde(deserialize_with = "quantity_from_number_or_string")]
    pub quantity: u32,

    /// Discount applied to every unit when buying `quantity` units.
    #[serde(alias = "discountPercent", alias = "discount_percent")]
    pub discount: DiscountPercent,
}

impl BulkDiscount {
    /// Create a tier.
    pub fn new(quantity: u32, discount: impl Into<DiscountPercent>) -> Self {
        BulkDiscount {
            quantity,
            discount: discount.into(),
        }
    }

    /// Whether the tier is a real bulk offer: at least
    /// [`MIN_TIER_QUANTITY`] units at a discount within `0..=100` percent.
    pub fn is_valid(&self) -> bool {
        self.quantity >= MIN_TIER_QUANTITY && self.discount.is_valid()
    }
}

/// Smallest quantity a bulk tier can be offered for.
pub const MIN_TIER_QUANTITY: u32 = 2;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Number(u32),
    Text(String),
}

fn quantity_from_number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match RawQuantity::deserialize(deserializer)? {
        RawQuantity::Number(quantity) => Ok(quantity),
        RawQuantity::Text(text) => text.trim().parse().map_err(de::Error::custom),
    }
}

/// Discount for buying exactly `quantity` units.
///
/// Only an exact tier match counts: there is no interpolation between tiers
/// and no fallback to the nearest smaller tier. The first matching tier wins.
pub fn tier_for(tiers: &[BulkDiscount], quantity: u32) -> DiscountPercent {
    tiers
        .iter()
        .find(|tier| tier.quantity == quantity)
        .map_or(DiscountPercent::ZERO, |tier| tier.discount)
}

/// Largest discount offered by any tier, or zero without tiers.
pub fn max_discount(tiers: &[BulkDiscount]) -> DiscountPercent {
    tiers
        .iter()
        .map(|tier| tier.discount)
        .max()
        .unwrap_or(DiscountPercent::ZERO)
}
