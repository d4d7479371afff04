//! Cart store
//!
//! Owns the cart, writes a full snapshot to storage after every successful
//! mutation and then notifies subscribers. Storage failures never undo a
//! mutation: the in-memory cart stays authoritative and the failure is logged.

use std::fmt;

use rusty_money::{Money, iso::Currency};
use tracing::{debug, error, warn};

use crate::{
    cart::{Cart, CartError, CartEvent, MergePolicy, snapshot},
    products::{Product, ProductId},
    storage::{CART_KEY, Storage},
    variants::Variant,
};

/// Handle returned by [`CartStore::subscribe`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&CartEvent, &Cart)>;

/// Cart plus persistence and change notification.
pub struct CartStore<S> {
    cart: Cart,
    storage: S,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl<S: fmt::Debug> fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .field("storage", &self.storage)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl<S: Storage> CartStore<S> {
    /// Open the store, rehydrating the cart from `storage`.
    ///
    /// A missing snapshot gives an empty cart. So does an unreadable or
    /// corrupt one, after logging; opening never fails.
    pub fn open(storage: S, currency: &'static Currency, policy: MergePolicy) -> Self {
        let lines = match storage.get(CART_KEY) {
            Ok(Some(text)) => match snapshot::decode(&text, currency) {
                Ok(lines) => lines,
                Err(err) => {
                    warn!(error = %err, "discarding unreadable cart snapshot");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                error!(error = %err, "failed to read cart snapshot");
                Vec::new()
            }
        };

        debug!(lines = lines.len(), "opened cart store");

        CartStore {
            cart: Cart::with_lines(lines, currency, policy),
            storage,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Current cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Add `product` as `variant`. See [`Cart::add_line`].
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the line cannot be priced or merged; nothing
    /// is persisted in that case.
    pub fn add_line(
        &mut self,
        product: &Product<'_>,
        variant: &Variant,
    ) -> Result<CartEvent, CartError> {
        let event = self.cart.add_line(product, variant)?;

        Ok(self.commit(event))
    }

    /// Increase the first line for `product_id` by one.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line matches.
    pub fn increase_quantity(&mut self, product_id: &ProductId) -> Result<CartEvent, CartError> {
        let event = self.cart.increase_quantity(product_id)?;

        Ok(self.commit(event))
    }

    /// Decrease the first line for `product_id` by one, removing it at one.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line matches.
    pub fn decrease_quantity(&mut self, product_id: &ProductId) -> Result<CartEvent, CartError> {
        let event = self.cart.decrease_quantity(product_id)?;

        Ok(self.commit(event))
    }

    /// Remove the first line for `product_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line matches.
    pub fn remove_line(&mut self, product_id: &ProductId) -> Result<CartEvent, CartError> {
        let event = self.cart.remove_line(product_id)?;

        Ok(self.commit(event))
    }

    /// Remove every line.
    pub fn clear(&mut self) -> CartEvent {
        let event = self.cart.clear();

        self.commit(event)
    }

    /// Cart total.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError::Pricing`] if a line total overflows.
    pub fn total(&self) -> Result<Money<'static, Currency>, CartError> {
        self.cart.total()
    }

    /// Register a callback run after every successful mutation, once the
    /// snapshot has been written.
    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&CartEvent, &Cart) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;

        self.subscribers.push((id, Box::new(subscriber)));

        id
    }

    /// Remove a subscriber. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);

        self.subscribers.len() != before
    }

    /// Backing storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub(crate) fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Consume the store, returning its storage.
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn commit(&mut self, event: CartEvent) -> CartEvent {
        self.persist();

        for (_, subscriber) in &mut self.subscribers {
            subscriber(&event, &self.cart);
        }

        event
    }

    fn persist(&mut self) {
        let text = match snapshot::encode(&self.cart) {
            Ok(text) => text,
            Err(err) => {
                error!(error = %err, "failed to encode cart snapshot");
                return;
            }
        };

        if let Err(err) = self.storage.set(CART_KEY, &text) {
            error!(error = %err, "failed to persist cart snapshot");
        }
    }
}
