//! Products

use std::fmt;

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

use crate::{
    discounts::{BulkDiscount, DiscountPercent, max_discount},
    photos::PhotoField,
};

/// Backend product identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product identifier.
    pub fn new(id: impl Into<String>) -> Self {
        ProductId(id.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        ProductId::new(id)
    }
}

/// Product, as read from the catalogue. Never mutated by the cart.
#[derive(Debug, Clone)]
pub struct Product<'a> {
    /// Product identifier
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// URL slug
    pub slug: Option<String>,

    /// Long description
    pub description: Option<String>,

    /// Full unit price
    pub price: Money<'a, Currency>,

    /// Photo field, in whatever shape the backend sent
    pub photo: PhotoField,

    /// Bulk-discount tiers in authoring order
    pub bulk_discounts: Vec<BulkDiscount>,
}

impl<'a> Product<'a> {
    /// Create a product with no slug, description, photos or tiers.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money<'a, Currency>,
    ) -> Self {
        Product {
            id: id.into(),
            name: name.into(),
            slug: None,
            description: None,
            price,
            photo: PhotoField::Absent,
            bulk_discounts: Vec::new(),
        }
    }

    /// Set the photo field.
    #[must_use]
    pub fn with_photo(mut self, photo: impl Into<PhotoField>) -> Self {
        self.photo = photo.into();
        self
    }

    /// Set the bulk-discount tiers.
    #[must_use]
    pub fn with_bulk_discounts(mut self, tiers: impl Into<Vec<BulkDiscount>>) -> Self {
        self.bulk_discounts = tiers.into();
        self
    }

    /// Best discount any tier offers, for "up to N% off" badges.
    pub fn max_discount(&self) -> DiscountPercent {
        max_discount(&self.bulk_discounts)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        ProductId(id)
    }
}
