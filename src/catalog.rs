//! Catalog
//!
//! Read-only product catalogue. Loads either a YAML catalogue file or the JSON
//! body of the backend's product listing endpoint.

use std::{fs, path::Path};

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    discounts::BulkDiscount,
    photos::PhotoField,
    products::{Product, ProductId},
};

/// Catalogue loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading a catalogue file
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("failed to parse catalog YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// JSON parsing error
    #[error("failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Unknown currency code
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// A product price was negative
    #[error("product {0} has a negative price")]
    NegativePrice(ProductId),

    /// A bulk tier has fewer than two units or a discount outside 0-100%
    /// (product, tier quantity)
    #[error("product {0} has an invalid bulk tier for {1} units")]
    InvalidTier(ProductId, u32),

    /// Two products share an identifier
    #[error("duplicate product id: {0}")]
    DuplicateProduct(ProductId),

    /// Product not found
    #[error("product not found: {0}")]
    ProductNotFound(String),
}

/// Catalogue file layout
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    /// ISO currency code; falls back to the caller's default when missing
    #[serde(default)]
    pub currency: Option<String>,

    /// Products in listing order
    pub products: Vec<ProductRecord>,
}

/// Product as the backend serialises it
#[derive(Debug, Deserialize)]
pub struct ProductRecord {
    /// Product identifier (`_id` in backend payloads)
    #[serde(alias = "_id")]
    pub id: String,

    /// Product name
    pub name: String,

    /// URL slug
    #[serde(default)]
    pub slug: Option<String>,

    /// Long description
    #[serde(default)]
    pub description: Option<String>,

    /// Full unit price in whole currency units
    pub price: Decimal,

    /// Photo field in any upstream shape
    #[serde(default)]
    pub photo: PhotoField,

    /// Bulk-discount tiers
    #[serde(default, alias = "bulkDiscounts")]
    pub bulk_discounts: Vec<BulkDiscount>,
}

impl ProductRecord {
    fn into_product(
        self,
        currency: &'static iso::Currency,
    ) -> Result<Product<'static>, CatalogError> {
        let id = ProductId::new(self.id);

        if self.price.is_sign_negative() {
            return Err(CatalogError::NegativePrice(id));
        }

        if let Some(tier) = self.bulk_discounts.iter().find(|tier| !tier.is_valid()) {
            return Err(CatalogError::InvalidTier(id, tier.quantity));
        }

        Ok(Product {
            id,
            name: self.name,
            slug: self.slug,
            description: self.description,
            price: Money::from_decimal(self.price, currency),
            photo: self.photo,
            bulk_discounts: self.bulk_discounts,
        })
    }
}

/// Loaded catalogue
#[derive(Debug)]
pub struct Catalog {
    currency: &'static iso::Currency,
    products: Vec<Product<'static>>,
    index: FxHashMap<ProductId, usize>,
}

impl Catalog {
    /// Build a catalogue from already-constructed products.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateProduct`] if two products share an id.
    pub fn new(
        currency: &'static iso::Currency,
        products: impl IntoIterator<Item = Product<'static>>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Catalog {
            currency,
            products: Vec::new(),
            index: FxHashMap::default(),
        };

        for product in products {
            catalog.insert(product)?;
        }

        Ok(catalog)
    }

    /// Load a YAML catalogue file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, names an unknown
    /// currency, or contains invalid products.
    pub fn load(
        path: impl AsRef<Path>,
        default_currency: &'static iso::Currency,
    ) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let file: CatalogFile = serde_norway::from_str(&contents)?;

        Self::from_file(file, default_currency)
    }

    /// Parse the JSON body of a product listing response.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or contains invalid products.
    pub fn from_json(
        json: &str,
        default_currency: &'static iso::Currency,
    ) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;

        Self::from_file(file, default_currency)
    }

    fn from_file(
        file: CatalogFile,
        default_currency: &'static iso::Currency,
    ) -> Result<Self, CatalogError> {
        let currency = match file.currency.as_deref() {
            Some(code) => find_currency(code)?,
            None => default_currency,
        };

        let products = file
            .products
            .into_iter()
            .map(|record| record.into_product(currency))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            products = products.len(),
            currency = currency.iso_alpha_code,
            "loaded catalog"
        );

        Self::new(currency, products)
    }

    fn insert(&mut self, product: Product<'static>) -> Result<(), CatalogError> {
        if self.index.contains_key(&product.id) {
            return Err(CatalogError::DuplicateProduct(product.id));
        }

        self.index.insert(product.id.clone(), self.products.len());
        self.products.push(product);

        Ok(())
    }

    /// Look up a product by identifier.
    pub fn get(&self, id: &ProductId) -> Option<&Product<'static>> {
        self.index.get(id).and_then(|idx| self.products.get(*idx))
    }

    /// Look up a product by identifier, failing if it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProductNotFound`] if there is no such product.
    pub fn product(&self, id: &str) -> Result<&Product<'static>, CatalogError> {
        self.get(&ProductId::from(id))
            .ok_or_else(|| CatalogError::ProductNotFound(id.to_string()))
    }

    /// Products in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &Product<'static>> {
        self.products.iter()
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalogue is empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Currency every product is priced in.
    pub fn currency(&self) -> &'static iso::Currency {
        self.currency
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Product<'static>;
    type IntoIter = std::slice::Iter<'a, Product<'static>>;

    fn into_iter(self) -> Self::IntoIter {
        self.products.iter()
    }
}

/// Resolve an ISO currency code.
///
/// # Errors
///
/// Returns [`CatalogError::UnknownCurrency`] if the code is not an ISO 4217 code.
pub fn find_currency(code: &str) -> Result<&'static iso::Currency, CatalogError> {
    iso::find(code.trim()).ok_or_else(|| CatalogError::UnknownCurrency(code.to_string()))
}
