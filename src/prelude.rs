//! Storefront prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    auth::{AuthRecord, User},
    cart::{Cart, CartError, CartEvent, CartLine, CartStore, MergePolicy, SubscriptionId},
    catalog::{Catalog, CatalogError},
    checkout::{CheckoutError, CheckoutRequest, PaymentStatus},
    discounts::{BulkDiscount, DiscountPercent},
    photos::PhotoField,
    pricing::{PricingError, Quote},
    products::{Product, ProductId},
    session::{Session, SessionError},
    storage::{FileStorage, MemoryStorage, Storage, StorageError},
    variants::{Variant, VariantError, VariantTag},
};
