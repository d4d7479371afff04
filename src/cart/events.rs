//! Cart events

use crate::{cart::CartLine, products::ProductId, variants::VariantTag};

/// A successful cart mutation, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum CartEvent {
    /// A new line was appended.
    LineAdded {
        /// Product the line is for
        product_id: ProductId,
        /// Variant the product was added as
        variant: VariantTag,
        /// Quantity of the new line
        quantity: u32,
    },

    /// An add was folded into an existing identical line.
    LineMerged {
        /// Product the line is for
        product_id: ProductId,
        /// Variant of the merged line
        variant: VariantTag,
        /// Quantity after merging
        quantity: u32,
    },

    /// A line's quantity went up or down by one.
    QuantityChanged {
        /// Product the line is for
        product_id: ProductId,
        /// Variant of the changed line
        variant: VariantTag,
        /// Quantity after the change
        quantity: u32,
    },

    /// A line left the cart, either explicitly or by decreasing past one.
    LineRemoved {
        /// The removed line
        line: CartLine,
    },

    /// Every line was removed.
    Cleared {
        /// Number of lines that were removed
        lines: usize,
    },
}

impl CartEvent {
    /// Product the event concerns, if it concerns a single product.
    pub fn product_id(&self) -> Option<&ProductId> {
        match self {
            CartEvent::LineAdded { product_id, .. }
            | CartEvent::LineMerged { product_id, .. }
            | CartEvent::QuantityChanged { product_id, .. } => Some(product_id),
            CartEvent::LineRemoved { line } => Some(line.product_id()),
            CartEvent::Cleared { .. } => None,
        }
    }
}
