//! Cart
//!
//! The cart is an ordered list of lines. Each line locks in its unit price
//! when it is created; later catalogue price changes never touch it.

use clap::ValueEnum;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    pricing::PricingError,
    products::{Product, ProductId},
    variants::Variant,
};

pub mod events;
pub mod line;
pub mod snapshot;
pub mod store;

pub use events::CartEvent;
pub use line::CartLine;
pub use store::{CartStore, SubscriptionId};

/// Errors raised by cart mutations.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// The product is priced in a different currency to the cart
    /// (product, product currency, cart currency).
    #[error("product {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(ProductId, &'static str, &'static str),

    /// No line exists for the product.
    #[error("no cart line for product {0}")]
    LineNotFound(ProductId),

    /// The variant's discount would take the unit price below zero.
    #[error("discount takes the price of product {0} below zero")]
    NegativePrice(ProductId),

    /// Incrementing a quantity would overflow.
    #[error("quantity overflow for product {0}")]
    QuantityOverflow(ProductId),

    /// Errors bubbled up from price calculation.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// What happens when a product is added with a variant already in the cart.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Identical product and variant pairs share one line; the existing line
    /// gains the variant's quantity and keeps its locked price.
    #[default]
    MergeIdentical,

    /// Every add appends a new line.
    Append,
}

/// Cart
#[derive(Debug, Clone)]
pub struct Cart {
    lines: Vec<CartLine>,
    currency: &'static Currency,
    policy: MergePolicy,
}

impl Cart {
    /// Create an empty cart.
    pub fn new(currency: &'static Currency, policy: MergePolicy) -> Self {
        Cart {
            lines: Vec::new(),
            currency,
            policy,
        }
    }

    pub(crate) fn with_lines(
        lines: Vec<CartLine>,
        currency: &'static Currency,
        policy: MergePolicy,
    ) -> Self {
        Cart {
            lines,
            currency,
            policy,
        }
    }

    /// Add a product to the cart as the given variant.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the product currency differs from the cart
    /// currency, the unit price cannot be calculated, or a merged quantity
    /// would overflow.
    pub fn add_line(
        &mut self,
        product: &Product<'_>,
        variant: &Variant,
    ) -> Result<CartEvent, CartError> {
        if self.policy == MergePolicy::MergeIdentical {
            let existing = self.lines.iter_mut().find(|line| {
                line.product_id() == &product.id && line.variant() == variant.tag()
            });

            if let Some(line) = existing {
                line.add_quantity(variant.quantity())?;

                debug!(
                    product = %product.id,
                    variant = %variant.tag(),
                    quantity = line.quantity(),
                    "merged cart line"
                );

                return Ok(CartEvent::LineMerged {
                    product_id: product.id.clone(),
                    variant: variant.tag(),
                    quantity: line.quantity(),
                });
            }
        }

        let line = CartLine::new(product, variant, self.currency)?;

        debug!(
            product = %product.id,
            variant = %variant.tag(),
            unit_price = %line.unit_price(),
            quantity = line.quantity(),
            "added cart line"
        );

        let event = CartEvent::LineAdded {
            product_id: line.product_id().clone(),
            variant: line.variant(),
            quantity: line.quantity(),
        };

        self.lines.push(line);

        Ok(event)
    }

    /// Increase the quantity of the first line for `product_id` by one.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line matches.
    pub fn increase_quantity(&mut self, product_id: &ProductId) -> Result<CartEvent, CartError> {
        let line = self.first_line_mut(product_id)?;

        line.add_quantity(1)?;

        Ok(CartEvent::QuantityChanged {
            product_id: product_id.clone(),
            variant: line.variant(),
            quantity: line.quantity(),
        })
    }

    /// Decrease the quantity of the first line for `product_id` by one. A line
    /// at quantity one is removed instead.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line matches.
    pub fn decrease_quantity(&mut self, product_id: &ProductId) -> Result<CartEvent, CartError> {
        let idx = self.first_index(product_id)?;

        let Some(line) = self.lines.get_mut(idx) else {
            return Err(CartError::LineNotFound(product_id.clone()));
        };

        if line.quantity() > 1 {
            line.remove_one();

            return Ok(CartEvent::QuantityChanged {
                product_id: product_id.clone(),
                variant: line.variant(),
                quantity: line.quantity(),
            });
        }

        let removed = self.lines.remove(idx);

        debug!(product = %product_id, "removed cart line at quantity one");

        Ok(CartEvent::LineRemoved { line: removed })
    }

    /// Remove the first line for `product_id`. Other lines for the same
    /// product under different variants stay in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line matches.
    pub fn remove_line(&mut self, product_id: &ProductId) -> Result<CartEvent, CartError> {
        let idx = self.first_index(product_id)?;
        let removed = self.lines.remove(idx);

        debug!(product = %product_id, variant = %removed.variant(), "removed cart line");

        Ok(CartEvent::LineRemoved { line: removed })
    }

    /// Remove every line.
    pub fn clear(&mut self) -> CartEvent {
        let lines = self.lines.len();
        self.lines.clear();

        CartEvent::Cleared { lines }
    }

    /// Sum of every line total.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError::Pricing`] if a line total overflows.
    pub fn total(&self) -> Result<Money<'static, Currency>, CartError> {
        let total = self.lines.iter().try_fold(
            Money::from_minor(0, self.currency),
            |acc, line| -> Result<_, PricingError> { Ok(acc.add(line.line_total()?)?) },
        )?;

        Ok(total)
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity())).sum()
    }

    /// Currency of the cart.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Merge policy the cart was created with.
    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    fn first_index(&self, product_id: &ProductId) -> Result<usize, CartError> {
        self.lines
            .iter()
            .position(|line| line.product_id() == product_id)
            .ok_or_else(|| CartError::LineNotFound(product_id.clone()))
    }

    fn first_line_mut(&mut self, product_id: &ProductId) -> Result<&mut CartLine, CartError> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id() == product_id)
            .ok_or_else(|| CartError::LineNotFound(product_id.clone()))
    }
}
