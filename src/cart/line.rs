//! Cart lines

use rusty_money::{Money, iso::Currency};

use crate::{
    cart::CartError,
    discounts::DiscountPercent,
    pricing::{PricingError, line_total, unit_price},
    products::{Product, ProductId},
    variants::{Variant, VariantTag},
};

/// One product and variant in the cart, with its locked-in unit price.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    product_id: ProductId,
    variant: VariantTag,
    name: String,
    photo: Option<String>,
    unit_price: Money<'static, Currency>,
    quantity: u32,
    discount: DiscountPercent,
}

impl CartLine {
    /// Price a new line for `product` bought as `variant`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] when the product is not priced
    /// in `currency`, [`CartError::NegativePrice`] when the variant's discount
    /// exceeds the price, or a [`CartError::Pricing`] if the unit price
    /// overflows.
    pub fn new(
        product: &Product<'_>,
        variant: &Variant,
        currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let product_currency = product.price.currency();

        if product_currency != currency {
            return Err(CartError::CurrencyMismatch(
                product.id.clone(),
                product_currency.iso_alpha_code,
                currency.iso_alpha_code,
            ));
        }

        let base = Money::from_decimal(*product.price.amount(), currency);
        let unit_price = unit_price(base, variant.discount())?;

        if unit_price.amount().is_sign_negative() {
            return Err(CartError::NegativePrice(product.id.clone()));
        }

        Ok(CartLine {
            product_id: product.id.clone(),
            variant: variant.tag(),
            name: product.name.clone(),
            photo: product.photo.first(),
            unit_price,
            quantity: variant.quantity(),
            discount: variant.discount(),
        })
    }

    pub(crate) fn restore(
        product_id: ProductId,
        variant: VariantTag,
        name: String,
        photo: Option<String>,
        unit_price: Money<'static, Currency>,
        quantity: u32,
        discount: DiscountPercent,
    ) -> Self {
        CartLine {
            product_id,
            variant,
            name,
            photo,
            unit_price,
            quantity,
            discount,
        }
    }

    /// Product identifier.
    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Variant the product was added as.
    pub fn variant(&self) -> VariantTag {
        self.variant
    }

    /// Product name at the time the line was created.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First product photo at the time the line was created.
    pub fn photo(&self) -> Option<&str> {
        self.photo.as_deref()
    }

    /// Locked-in, discounted per-unit price.
    pub fn unit_price(&self) -> &Money<'static, Currency> {
        &self.unit_price
    }

    /// Units on this line. Always at least one.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Discount applied to the unit price.
    pub fn discount(&self) -> DiscountPercent {
        self.discount
    }

    /// `unit_price × quantity`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the total does not fit a decimal.
    pub fn line_total(&self) -> Result<Money<'static, Currency>, PricingError> {
        line_total(self.unit_price, self.quantity)
    }

    pub(crate) fn add_quantity(&mut self, quantity: u32) -> Result<(), CartError> {
        self.quantity = self
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| CartError::QuantityOverflow(self.product_id.clone()))?;

        Ok(())
    }

    /// Callers remove the line instead of taking it below one.
    pub(crate) fn remove_one(&mut self) {
        debug_assert!(self.quantity > 1, "line quantity must stay at least one");
        self.quantity = self.quantity.saturating_sub(1).max(1);
    }
}
