//! Receipt
//!
//! Terminal tables for the cart and the catalogue.

use std::io;

use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

use crate::{
    cart::{Cart, CartError},
    catalog::Catalog,
    photos,
    pricing::PricingError,
};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Error calculating the cart total.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Error calculating a line total.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Writes the cart as a table followed by its item count and total.
///
/// # Errors
///
/// Returns an error if a total cannot be calculated or the output cannot be
/// written.
pub fn write_cart(mut out: impl io::Write, cart: &Cart) -> Result<(), ReceiptError> {
    if cart.is_empty() {
        return writeln!(out, "Your cart is empty").map_err(|_err| ReceiptError::IO);
    }

    let mut builder = Builder::default();

    builder.push_record(["", "Item", "Variant", "Unit Price", "Qty", "Discount", "Line Total"]);

    for (idx, line) in cart.lines().iter().enumerate() {
        let discount = if line.discount().is_zero() {
            String::new()
        } else {
            line.discount().to_string()
        };

        builder.push_record([
            format!("#{}", idx + 1),
            format!("{} ({})", line.name(), line.product_id()),
            line.variant().to_string(),
            line.unit_price().to_string(),
            line.quantity().to_string(),
            discount,
            line.line_total()?.to_string(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(3..), Alignment::right());

    writeln!(out, "{table}").map_err(|_err| ReceiptError::IO)?;
    writeln!(out, " Items: {}", cart.item_count()).map_err(|_err| ReceiptError::IO)?;
    writeln!(out, " Total: {}", cart.total()?).map_err(|_err| ReceiptError::IO)
}

/// Writes the catalogue as a table.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_catalog(mut out: impl io::Write, catalog: &Catalog) -> Result<(), ReceiptError> {
    let mut builder = Builder::default();

    builder.push_record(["Id", "Name", "Price", "Offer", "Bulk Tiers", "Photos"]);

    for product in catalog {
        let max_discount = product.max_discount();

        let offer = if max_discount.is_zero() {
            String::new()
        } else {
            format!("up to {max_discount} off")
        };

        let tiers = product
            .bulk_discounts
            .iter()
            .map(|tier| format!("{} @ {}", tier.quantity, tier.discount))
            .collect::<Vec<_>>()
            .join(", ");

        builder.push_record([
            product.id.to_string(),
            product.name.clone(),
            product.price.to_string(),
            offer,
            tiers,
            photos::normalize(&product.photo).len().to_string(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::one(2), Alignment::right());

    writeln!(out, "{table}").map_err(|_err| ReceiptError::IO)
}
