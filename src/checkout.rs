//! Checkout
//!
//! Builds the payload that starts a payment with the gateway and interprets
//! the status the gateway reports back. Sending either request is left to the
//! caller.

use jiff::Timestamp;
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::{
    auth::AuthRecord,
    cart::{Cart, CartError},
    products::ProductId,
};

/// Prefix of every order identifier.
pub const ORDER_ID_PREFIX: &str = "ORD";

/// Longest order identifier the gateway accepts.
pub const MAX_ORDER_ID_LEN: usize = 21;

const RADIX: u32 = 36;
const ORDER_ID_RANDOM_CHARS: usize = 4;
const GUEST_ID_RANDOM_CHARS: usize = 8;
const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Checkout errors
#[derive(Debug, Error, PartialEq)]
pub enum CheckoutError {
    /// Checkout requires a signed-in user
    #[error("log in to check out")]
    NotAuthenticated,

    /// Nothing to pay for
    #[error("cart is empty")]
    EmptyCart,

    /// The cart total could not be calculated
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Customer details sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    /// User id, email, or a generated guest id
    pub customer_id: String,

    /// Email address
    pub customer_email: String,

    /// Phone number; empty when unknown
    pub customer_phone: String,

    /// Display name
    pub customer_name: String,
}

/// Line summary sent with the payment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutProduct {
    /// Product identifier
    pub product_id: ProductId,

    /// Product name
    pub name: String,

    /// Discounted unit price in whole currency units
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    /// Units bought
    pub quantity: u32,
}

/// Payment initiation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Cart total in whole currency units
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    /// Paying customer
    pub customer: Customer,

    /// Order identifier, unique per attempt
    pub order_id: String,

    /// Where the gateway sends the shopper once payment completes
    pub redirect_url: String,

    /// Cart lines being paid for
    pub products: Vec<CheckoutProduct>,
}

impl CheckoutRequest {
    /// Build a payment request for `cart`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NotAuthenticated`] without an auth record,
    /// [`CheckoutError::EmptyCart`] for an empty cart, or a
    /// [`CheckoutError::Cart`] if the total overflows.
    pub fn build<R: Rng + ?Sized>(
        cart: &Cart,
        auth: Option<&AuthRecord>,
        redirect_url: impl Into<String>,
        now: Timestamp,
        rng: &mut R,
    ) -> Result<Self, CheckoutError> {
        let auth = auth
            .filter(|auth| !auth.token.is_empty())
            .ok_or(CheckoutError::NotAuthenticated)?;

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let user = &auth.user;

        let customer_id = user
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| Some(user.email.clone()).filter(|email| !email.is_empty()))
            .unwrap_or_else(|| format!("guest_{}", random_base36(rng, GUEST_ID_RANDOM_CHARS)));

        let products = cart
            .lines()
            .iter()
            .map(|line| CheckoutProduct {
                product_id: line.product_id().clone(),
                name: if line.name().is_empty() {
                    UNKNOWN_PRODUCT.to_string()
                } else {
                    line.name().to_string()
                },
                price: *line.unit_price().amount(),
                quantity: line.quantity(),
            })
            .collect();

        let request = CheckoutRequest {
            amount: *cart.total()?.amount(),
            customer: Customer {
                customer_id,
                customer_email: user.email.clone(),
                customer_phone: user.phone.clone().unwrap_or_default(),
                customer_name: user.name.clone(),
            },
            order_id: order_id(now, rng),
            redirect_url: redirect_url.into(),
            products,
        };

        info!(
            order_id = %request.order_id,
            amount = %request.amount,
            lines = request.products.len(),
            "built checkout request"
        );

        Ok(request)
    }
}

/// Generate an order identifier: the prefix, the timestamp in base 36 and a
/// few random base-36 characters, cut to [`MAX_ORDER_ID_LEN`].
pub fn order_id<R: Rng + ?Sized>(now: Timestamp, rng: &mut R) -> String {
    let millis = u64::try_from(now.as_millisecond()).unwrap_or_default();

    let mut id = format!(
        "{ORDER_ID_PREFIX}{}{}",
        to_base36(millis),
        random_base36(rng, ORDER_ID_RANDOM_CHARS)
    );
    id.truncate(MAX_ORDER_ID_LEN);

    id
}

fn to_base36(mut value: u64) -> String {
    let mut digits = Vec::new();

    loop {
        let digit = u32::try_from(value % u64::from(RADIX)).unwrap_or_default();
        digits.extend(char::from_digit(digit, RADIX));
        value /= u64::from(RADIX);

        if value == 0 {
            break;
        }
    }

    digits.iter().rev().collect()
}

fn random_base36<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .filter_map(|_| char::from_digit(rng.random_range(0..RADIX), RADIX))
        .collect()
}

/// Outcome reported by the payment status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Money was taken
    Charged,

    /// The gateway reported some other status
    Failed(String),

    /// No status yet
    Pending,
}

impl PaymentStatus {
    /// Gateway status string that marks a successful payment.
    pub const CHARGED: &'static str = "CHARGED";

    /// Interpret a status response of the form `{"status": {"status": ...}}`.
    pub fn from_response(response: &Value) -> Self {
        match response
            .get("status")
            .and_then(|status| status.get("status"))
            .and_then(Value::as_str)
        {
            Some(Self::CHARGED) => PaymentStatus::Charged,
            Some(other) => PaymentStatus::Failed(other.to_string()),
            None => PaymentStatus::Pending,
        }
    }

    /// Whether the payment went through.
    pub fn is_charged(&self) -> bool {
        *self == PaymentStatus::Charged
    }
}

/// Payment page URL from an initiation response, if the gateway sent one.
pub fn payment_url(response: &Value) -> Option<&str> {
    response
        .get("payment_url")
        .or_else(|| response.pointer("/session/payment_links/web"))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};
    use rusty_money::{Money, iso::INR};
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        auth::User,
        cart::MergePolicy,
        discounts::BulkDiscount,
        products::Product,
        variants::Variant,
    };

    use super::*;

    fn auth(id: Option<&str>, email: &str) -> AuthRecord {
        AuthRecord::new(
            User {
                id: id.map(str::to_string),
                name: "Asha".to_string(),
                email: email.to_string(),
                phone: Some("9999999999".to_string()),
                ..User::default()
            },
            "jwt",
        )
    }

    fn cart() -> TestResult<Cart> {
        let product = Product::new("p-100", "Reading Glasses", Money::from_major(100, INR))
            .with_bulk_discounts([BulkDiscount::new(10, 5)]);

        let mut cart = Cart::new(INR, MergePolicy::MergeIdentical);
        cart.add_line(&product, &Variant::single())?;
        cart.add_line(&product, &Variant::bulk(&BulkDiscount::new(10, 5))?)?;

        Ok(cart)
    }

    fn now() -> TestResult<Timestamp> {
        Ok(Timestamp::from_millisecond(1_718_000_000_000)?)
    }

    #[test]
    fn request_carries_total_customer_and_lines() -> TestResult {
        let mut rng = StdRng::seed_from_u64(7);
        let auth = auth(Some("u-1"), "asha@example.com");

        let request = CheckoutRequest::build(
            &cart()?,
            Some(&auth),
            "https://shop.example/callback",
            now()?,
            &mut rng,
        )?;

        assert_eq!(request.amount, Decimal::from(1050));
        assert_eq!(request.customer.customer_id, "u-1");
        assert_eq!(request.customer.customer_phone, "9999999999");
        assert_eq!(request.products.len(), 2);
        assert_eq!(
            request.products.get(1).map(|product| (product.price, product.quantity)),
            Some((Decimal::from(95), 10))
        );

        Ok(())
    }

    #[test]
    fn request_uses_gateway_field_names() -> TestResult {
        let mut rng = StdRng::seed_from_u64(7);
        let auth = auth(Some("u-1"), "asha@example.com");

        let request = CheckoutRequest::build(&cart()?, Some(&auth), "/cb", now()?, &mut rng)?;
        let value = serde_json::to_value(&request)?;

        assert_eq!(value.get("amount"), Some(&json!(1050.0)));
        assert_eq!(value.get("redirectUrl"), Some(&json!("/cb")));
        assert!(value.get("orderId").is_some());
        assert_eq!(value.pointer("/customer/customer_name"), Some(&json!("Asha")));
        assert_eq!(value.pointer("/products/0/product_id"), Some(&json!("p-100")));

        Ok(())
    }

    #[test]
    fn customer_id_falls_back_to_email_then_guest() -> TestResult {
        let mut rng = StdRng::seed_from_u64(7);
        let cart = cart()?;

        let by_email = auth(None, "asha@example.com");
        let request = CheckoutRequest::build(&cart, Some(&by_email), "/cb", now()?, &mut rng)?;
        assert_eq!(request.customer.customer_id, "asha@example.com");

        let guest = auth(Some(""), "");
        let request = CheckoutRequest::build(&cart, Some(&guest), "/cb", now()?, &mut rng)?;
        let suffix = request
            .customer
            .customer_id
            .strip_prefix("guest_")
            .ok_or("Expected a guest id")?;

        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));

        Ok(())
    }

    #[test]
    fn unauthenticated_and_empty_carts_are_rejected() -> TestResult {
        let mut rng = StdRng::seed_from_u64(7);
        let auth = auth(Some("u-1"), "asha@example.com");
        let empty = Cart::new(INR, MergePolicy::MergeIdentical);

        assert_eq!(
            CheckoutRequest::build(&cart()?, None, "/cb", now()?, &mut rng),
            Err(CheckoutError::NotAuthenticated)
        );
        assert_eq!(
            CheckoutRequest::build(&empty, Some(&auth), "/cb", now()?, &mut rng),
            Err(CheckoutError::EmptyCart)
        );

        Ok(())
    }

    #[test]
    fn order_ids_are_prefixed_and_bounded() -> TestResult {
        let mut rng = StdRng::seed_from_u64(42);

        let id = order_id(now()?, &mut rng);

        assert!(id.starts_with(ORDER_ID_PREFIX));
        assert!(id.len() <= MAX_ORDER_ID_LEN);
        assert_eq!(id.get(3..11), Some("lx8kuby8"));

        Ok(())
    }

    #[test]
    fn base36_matches_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_718_000_000_000), "lx8kuby8");
    }

    #[test]
    fn payment_status_is_read_from_nested_status() {
        assert_eq!(
            PaymentStatus::from_response(&json!({"status": {"status": "CHARGED"}})),
            PaymentStatus::Charged
        );
        assert_eq!(
            PaymentStatus::from_response(&json!({"status": {"status": "AUTHORIZATION_FAILED"}})),
            PaymentStatus::Failed("AUTHORIZATION_FAILED".to_string())
        );
        assert_eq!(PaymentStatus::from_response(&json!({})), PaymentStatus::Pending);
    }

    #[test]
    fn payment_url_prefers_top_level_link() {
        let direct = json!({"payment_url": "https://pay/1", "session": {}});
        let nested = json!({"session": {"payment_links": {"web": "https://pay/2"}}});

        assert_eq!(payment_url(&direct), Some("https://pay/1"));
        assert_eq!(payment_url(&nested), Some("https://pay/2"));
        assert_eq!(payment_url(&json!({})), None);
    }
}
