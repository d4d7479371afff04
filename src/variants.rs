//! Variants
//!
//! A variant is one way of buying a product: a single unit, one of the
//! product's predefined bulk tiers, or a quantity typed in by the shopper.
//! Each variant resolves to its own unit price.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    discounts::{BulkDiscount, DiscountPercent, tier_for},
    products::Product,
};

/// Errors raised when building or parsing a variant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VariantError {
    /// The quantity was not a positive whole number.
    #[error("invalid quantity: {0:?}")]
    InvalidQuantity(String),

    /// The quantity was zero.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// The variant tag was not one of `single`, `bulk_<qty>` or `manual_<qty>`.
    #[error("unrecognised variant tag: {0:?}")]
    UnknownTag(String),

    /// The product has no bulk tier for the quantity.
    #[error("no bulk tier for {0} units")]
    NoSuchTier(u32),
}

/// Identifies a variant; rendered as `single`, `bulk_<qty>` or `manual_<qty>`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VariantTag {
    /// One unit at full price.
    #[default]
    Single,

    /// A predefined bulk tier for the given quantity.
    Bulk(u32),

    /// A quantity entered by the shopper.
    Manual(u32),
}

impl fmt::Display for VariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantTag::Single => f.write_str("single"),
            VariantTag::Bulk(quantity) => write!(f, "bulk_{quantity}"),
            VariantTag::Manual(quantity) => write!(f, "manual_{quantity}"),
        }
    }
}

impl FromStr for VariantTag {
    type Err = VariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "single" {
            return Ok(VariantTag::Single);
        }

        let tagged = |prefix: &str| {
            s.strip_prefix(prefix).map(|qty| {
                qty.parse::<u32>()
                    .map_err(|_err| VariantError::UnknownTag(s.to_string()))
            })
        };

        match (tagged("bulk_"), tagged("manual_")) {
            (Some(quantity), _) => Ok(VariantTag::Bulk(quantity?)),
            (_, Some(quantity)) => Ok(VariantTag::Manual(quantity?)),
            (None, None) => Err(VariantError::UnknownTag(s.to_string())),
        }
    }
}

impl TryFrom<String> for VariantTag {
    type Error = VariantError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VariantTag> for String {
    fn from(tag: VariantTag) -> Self {
        tag.to_string()
    }
}

/// A purchasable option for a product.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Variant {
    tag: VariantTag,
    quantity: u32,
    discount: DiscountPercent,
}

impl Variant {
    /// One unit, no discount.
    pub fn single() -> Self {
        Variant {
            tag: VariantTag::Single,
            quantity: 1,
            discount: DiscountPercent::ZERO,
        }
    }

    /// The variant for a predefined bulk tier.
    ///
    /// # Errors
    ///
    /// Returns [`VariantError::ZeroQuantity`] for a tier with a zero quantity.
    pub fn bulk(tier: &BulkDiscount) -> Result<Self, VariantError> {
        if tier.quantity == 0 {
            return Err(VariantError::ZeroQuantity);
        }

        Ok(Variant {
            tag: VariantTag::Bulk(tier.quantity),
            quantity: tier.quantity,
            discount: tier.discount,
        })
    }

    /// A shopper-entered quantity. The discount is the tier whose quantity
    /// matches exactly, if any.
    ///
    /// # Errors
    ///
    /// Returns [`VariantError::ZeroQuantity`] when `quantity` is zero.
    pub fn manual(tiers: &[BulkDiscount], quantity: u32) -> Result<Self, VariantError> {
        if quantity == 0 {
            return Err(VariantError::ZeroQuantity);
        }

        Ok(Variant {
            tag: VariantTag::Manual(quantity),
            quantity,
            discount: tier_for(tiers, quantity),
        })
    }

    /// Resolve `tag` against the tiers `product` offers.
    ///
    /// # Errors
    ///
    /// Returns [`VariantError::NoSuchTier`] for a bulk tag the product does
    /// not offer, or [`VariantError::ZeroQuantity`] for a zero quantity.
    pub fn for_product(product: &Product<'_>, tag: VariantTag) -> Result<Self, VariantError> {
        match tag {
            VariantTag::Single => Ok(Variant::single()),
            VariantTag::Bulk(quantity) => product
                .bulk_discounts
                .iter()
                .find(|tier| tier.quantity == quantity)
                .ok_or(VariantError::NoSuchTier(quantity))
                .and_then(Variant::bulk),
            VariantTag::Manual(quantity) => Variant::manual(&product.bulk_discounts, quantity),
        }
    }

    /// Variant tag.
    pub fn tag(&self) -> VariantTag {
        self.tag
    }

    /// Units bought with this variant.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Per-unit discount.
    pub fn discount(&self) -> DiscountPercent {
        self.discount
    }
}

/// Bulk variants offered for a product, in tier order. Tiers with a zero
/// quantity are skipped.
pub fn bulk_options(product: &Product<'_>) -> Vec<Variant> {
    product
        .bulk_discounts
        .iter()
        .filter_map(|tier| Variant::bulk(tier).ok())
        .collect()
}

/// Parse a quantity typed by the shopper.
///
/// # Errors
///
/// Returns [`VariantError::InvalidQuantity`] for anything that is not a whole
/// number, and [`VariantError::ZeroQuantity`] for zero.
pub fn parse_quantity(input: &str) -> Result<u32, VariantError> {
    let quantity = input
        .trim()
        .parse::<u32>()
        .map_err(|_err| VariantError::InvalidQuantity(input.to_string()))?;

    if quantity == 0 {
        return Err(VariantError::ZeroQuantity);
    }

    Ok(quantity)
}
