//! Cart snapshots
//!
//! The whole cart is serialised to JSON after every mutation. Older snapshots
//! written by the browser storefront are a bare array of product objects with
//! `price`, `quantity`, `variant` and `bulkDiscount` merged in; those are
//! still accepted and priced in the cart's currency.

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::{
    cart::{Cart, CartLine},
    catalog::find_currency,
    discounts::DiscountPercent,
    photos::PhotoField,
    products::ProductId,
    variants::VariantTag,
};

/// Snapshot decoding errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot is not valid JSON for any known layout
    #[error("malformed cart snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot names a currency that does not exist
    #[error("unknown snapshot currency: {0}")]
    UnknownCurrency(String),

    /// The snapshot was written for a different currency (snapshot, cart)
    #[error("snapshot has currency {0}, but cart has currency {1}")]
    CurrencyMismatch(String, &'static str),

    /// A line has a quantity of zero
    #[error("line {0} has a zero quantity")]
    ZeroQuantity(usize),

    /// A line has a negative unit price
    #[error("line {0} has a negative price")]
    NegativePrice(usize),
}

/// Persisted form of a cart.
#[derive(Debug, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// ISO currency code of every price in the snapshot
    pub currency: String,

    /// Lines in insertion order
    pub items: Vec<LineRecord>,
}

/// Persisted form of a cart line. Field names follow the browser storefront.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRecord {
    /// Product identifier
    #[serde(rename = "_id")]
    pub product_id: ProductId,

    /// Product name
    #[serde(default)]
    pub name: String,

    /// First photo URL; legacy records carry the raw photo field
    #[serde(default, deserialize_with = "first_photo")]
    pub photo: Option<String>,

    /// Variant tag
    #[serde(default)]
    pub variant: VariantTag,

    /// Locked-in unit price in whole currency units
    pub price: Decimal,

    /// Units on the line
    pub quantity: u32,

    /// Discount applied to the unit price
    #[serde(default)]
    pub bulk_discount: DiscountPercent,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCart {
    Current(CartSnapshot),
    Legacy(Vec<LineRecord>),
}

fn first_photo<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    PhotoField::deserialize(deserializer).map(|photo| photo.first())
}

impl From<&CartLine> for LineRecord {
    fn from(line: &CartLine) -> Self {
        LineRecord {
            product_id: line.product_id().clone(),
            name: line.name().to_string(),
            photo: line.photo().map(str::to_string),
            variant: line.variant(),
            price: *line.unit_price().amount(),
            quantity: line.quantity(),
            bulk_discount: line.discount(),
        }
    }
}

impl From<&Cart> for CartSnapshot {
    fn from(cart: &Cart) -> Self {
        CartSnapshot {
            currency: cart.currency().iso_alpha_code.to_string(),
            items: cart.lines().iter().map(LineRecord::from).collect(),
        }
    }
}

/// Serialise a cart.
///
/// # Errors
///
/// Returns [`SnapshotError::Json`] if serialisation fails.
pub fn encode(cart: &Cart) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(&CartSnapshot::from(cart))?)
}

/// Decode a stored snapshot into cart lines priced in `currency`.
///
/// # Errors
///
/// Returns a [`SnapshotError`] if the text is not a snapshot, was written for
/// another currency, or contains an invalid line.
pub fn decode(text: &str, currency: &'static Currency) -> Result<Vec<CartLine>, SnapshotError> {
    let records = match serde_json::from_str::<StoredCart>(text)? {
        StoredCart::Current(snapshot) => {
            let stored = iso_currency(&snapshot.currency)?;

            if stored != currency {
                return Err(SnapshotError::CurrencyMismatch(
                    snapshot.currency,
                    currency.iso_alpha_code,
                ));
            }

            snapshot.items
        }
        StoredCart::Legacy(records) => records,
    };

    records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| into_line(idx, record, currency))
        .collect()
}

fn iso_currency(code: &str) -> Result<&'static Currency, SnapshotError> {
    find_currency(code).map_err(|_err| SnapshotError::UnknownCurrency(code.to_string()))
}

fn into_line(
    idx: usize,
    record: LineRecord,
    currency: &'static Currency,
) -> Result<CartLine, SnapshotError> {
    if record.quantity == 0 {
        return Err(SnapshotError::ZeroQuantity(idx));
    }

    if record.price.is_sign_negative() {
        return Err(SnapshotError::NegativePrice(idx));
    }

    Ok(CartLine::restore(
        record.product_id,
        record.variant,
        record.name,
        record.photo,
        Money::from_decimal(record.price, currency),
        record.quantity,
        record.bulk_discount,
    ))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{INR, USD};
    use testresult::TestResult;

    use crate::{
        cart::MergePolicy,
        discounts::BulkDiscount,
        products::Product,
        variants::Variant,
    };

    use super::*;

    fn cart() -> TestResult<Cart> {
        let product = Product::new("p-100", "Reading Glasses", Money::from_major(100, INR))
            .with_photo("a.jpg,b.jpg")
            .with_bulk_discounts([BulkDiscount::new(10, 5)]);

        let mut cart = Cart::new(INR, MergePolicy::MergeIdentical);
        cart.add_line(&product, &Variant::single())?;
        cart.add_line(&product, &Variant::bulk(&BulkDiscount::new(10, 5))?)?;

        Ok(cart)
    }

    #[test]
    fn encoded_cart_decodes_to_same_lines() -> TestResult {
        let cart = cart()?;
        let text = encode(&cart)?;

        let lines = decode(&text, INR)?;

        assert_eq!(lines.as_slice(), cart.lines());

        Ok(())
    }

    #[test]
    fn every_accepted_line_survives_a_round_trip() -> TestResult {
        let product = Product::new("p-99", "Blue Light Blockers", Money::from_major(99, INR))
            .with_bulk_discounts([
                BulkDiscount::new(2, 50),
                BulkDiscount::new(3, DiscountPercent::new(Decimal::new(125, 1))),
                BulkDiscount::new(4, 100),
                BulkDiscount::new(5, 150),
            ]);

        let mut cart = Cart::new(INR, MergePolicy::Append);
        let mut refused = 0;

        for quantity in 1..=6 {
            let variant = Variant::manual(&product.bulk_discounts, quantity)?;

            if cart.add_line(&product, &variant).is_err() {
                refused += 1;
            }
        }

        for tier in &product.bulk_discounts {
            if cart.add_line(&product, &Variant::bulk(tier)?).is_err() {
                refused += 1;
            }
        }

        let lines = decode(&encode(&cart)?, INR)?;

        assert_eq!(refused, 2);
        assert_eq!(lines.as_slice(), cart.lines());

        Ok(())
    }

    #[test]
    fn encoded_cart_uses_storefront_field_names() -> TestResult {
        let text = encode(&cart()?)?;
        let value: serde_json::Value = serde_json::from_str(&text)?;

        let bulk = value
            .get("items")
            .and_then(|items| items.get(1))
            .ok_or("Expected a second item")?;

        assert_eq!(value.get("currency"), Some(&serde_json::json!("INR")));
        assert_eq!(bulk.get("_id"), Some(&serde_json::json!("p-100")));
        assert_eq!(bulk.get("variant"), Some(&serde_json::json!("bulk_10")));
        assert_eq!(bulk.get("bulkDiscount"), Some(&serde_json::json!("5")));
        assert_eq!(bulk.get("photo"), Some(&serde_json::json!("a.jpg")));

        Ok(())
    }

    #[test]
    fn legacy_browser_snapshot_is_accepted() -> TestResult {
        let text = r#"[{
            "_id": "66b1",
            "name": "Sunglasses",
            "slug": "sunglasses",
            "photo": ["s1.jpg,s2.jpg"],
            "bulkDiscounts": [{"quantity": 10, "discount": 5}],
            "variant": "bulk_10",
            "price": 95,
            "quantity": 10,
            "bulkDiscount": 5
        }, {
            "_id": "66b2",
            "name": "Case",
            "price": 30,
            "quantity": 1
        }]"#;

        let lines = decode(text, INR)?;
        let [bulk, single] = lines.as_slice() else {
            return Err("expected two lines".into());
        };

        assert_eq!(bulk.variant(), VariantTag::Bulk(10));
        assert_eq!(bulk.photo(), Some("s1.jpg,s2.jpg"));
        assert_eq!(bulk.unit_price(), &Money::from_major(95, INR));
        assert_eq!(single.variant(), VariantTag::Single);
        assert_eq!(single.photo(), None);

        Ok(())
    }

    #[test]
    fn currency_mismatch_is_rejected() -> TestResult {
        let text = encode(&cart()?)?;

        assert!(matches!(
            decode(&text, USD),
            Err(SnapshotError::CurrencyMismatch(code, "USD")) if code == "INR"
        ));

        Ok(())
    }

    #[test]
    fn invalid_lines_are_rejected() {
        let zero = r#"[{"_id": "p", "price": 10, "quantity": 0}]"#;
        let negative = r#"[{"_id": "p", "price": -10, "quantity": 1}]"#;

        assert!(matches!(decode(zero, INR), Err(SnapshotError::ZeroQuantity(0))));
        assert!(matches!(decode(negative, INR), Err(SnapshotError::NegativePrice(0))));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(decode("not json", INR), Err(SnapshotError::Json(_))));
        assert!(matches!(decode(r#"{"items": 3}"#, INR), Err(SnapshotError::Json(_))));
    }
}
