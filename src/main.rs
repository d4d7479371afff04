//! Storefront CLI

use std::io::{self, Write};

use anyhow::Context;
use clap::{Parser, Subcommand};
use jiff::Timestamp;
use serde_json::Value;
use tracing::{error, info};

use storefront::{
    auth::{AuthRecord, User},
    cart::CartStore,
    checkout::{CheckoutRequest, PaymentStatus},
    config::{LoggingConfig, StoreConfig},
    observability,
    photos::{self, PhotoField},
    products::ProductId,
    receipt,
    storage::FileStorage,
    variants::{Variant, VariantTag, parse_quantity},
};

/// Storefront cart, pricing and checkout from the terminal
#[derive(Debug, Parser)]
#[command(name = "storefront", about, long_about = None)]
struct Cli {
    /// Storefront settings.
    #[command(flatten)]
    store: StoreConfig,

    /// Logging output settings.
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Load configuration from environment and CLI arguments
    fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the products in the catalogue
    Catalog,

    /// Add a product to the cart
    Add {
        /// Product identifier
        product: String,

        /// Buy one of the product's bulk tiers
        #[arg(long, conflicts_with_all = ["quantity", "variant"])]
        bulk: Option<u32>,

        /// Buy a custom quantity
        #[arg(long, conflicts_with = "variant")]
        quantity: Option<String>,

        /// Buy a variant by tag (`single`, `bulk_<qty>`, `manual_<qty>`)
        #[arg(long)]
        variant: Option<VariantTag>,
    },

    /// Add one unit to the first line for a product
    Increase {
        /// Product identifier
        product: String,
    },

    /// Take one unit off the first line for a product
    Decrease {
        /// Product identifier
        product: String,
    },

    /// Remove the first line for a product
    Remove {
        /// Product identifier
        product: String,
    },

    /// Show the cart
    Show,

    /// Empty the cart
    Clear,

    /// Normalise a raw photo field and print one URL per line
    Photos {
        /// Raw field value
        raw: String,

        /// Treat the value as JSON (`null`, an array, a quoted string)
        #[arg(long)]
        json: bool,
    },

    /// Store an auth record
    Login {
        /// Bearer token
        #[arg(long)]
        token: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// Email address
        #[arg(long)]
        email: String,

        /// User id
        #[arg(long)]
        id: Option<String>,

        /// Phone number
        #[arg(long)]
        phone: Option<String>,

        /// Role (1 for admin)
        #[arg(long, default_value_t = 0)]
        role: u8,
    },

    /// Forget the auth record; the cart is kept
    Logout,

    /// Print the payment initiation payload for the cart
    Checkout {
        /// Where the gateway sends the shopper after paying
        #[arg(long, env = "STOREFRONT_REDIRECT_URL")]
        redirect_url: String,
    },

    /// Interpret a payment status response, clearing the cart once charged
    PaymentStatus {
        /// Response body (JSON)
        response: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::load().unwrap_or_else(|err| err.exit());

    observability::init(&cli.logging)?;

    run(&cli, io::stdout().lock()).inspect_err(|err| {
        error!(error = format!("{err:#}"), "command failed");
    })
}

fn run(cli: &Cli, mut out: impl Write) -> anyhow::Result<()> {
    if let Command::Photos { raw, json } = &cli.command {
        let field = if *json {
            PhotoField::from(serde_json::from_str::<Value>(raw).context("invalid JSON")?)
        } else {
            PhotoField::from(raw.as_str())
        };

        for url in photos::normalize(&field) {
            writeln!(out, "{url}")?;
        }

        return Ok(());
    }

    if let Command::Catalog = &cli.command {
        receipt::write_catalog(&mut out, &cli.store.load_catalog()?)?;

        return Ok(());
    }

    let mut session = cli
        .store
        .open_session(cli.store.currency()?)
        .context("failed to open storage")?;

    log_cart_events(session.cart_mut());

    match &cli.command {
        Command::Add {
            product,
            bulk,
            quantity,
            variant,
        } => {
            let catalog = cli.store.load_catalog()?;
            let product = catalog.product(product)?;

            let tag = match (bulk, quantity, variant) {
                (Some(bulk), _, _) => VariantTag::Bulk(*bulk),
                (_, Some(quantity), _) => VariantTag::Manual(parse_quantity(quantity)?),
                (_, _, Some(variant)) => *variant,
                (None, None, None) => VariantTag::Single,
            };

            let variant = Variant::for_product(product, tag)?;
            session.cart_mut().add_line(product, &variant)?;

            receipt::write_cart(&mut out, session.cart().cart())?;
        }
        Command::Increase { product } => {
            session.cart_mut().increase_quantity(&ProductId::from(product.as_str()))?;
            receipt::write_cart(&mut out, session.cart().cart())?;
        }
        Command::Decrease { product } => {
            session.cart_mut().decrease_quantity(&ProductId::from(product.as_str()))?;
            receipt::write_cart(&mut out, session.cart().cart())?;
        }
        Command::Remove { product } => {
            session.cart_mut().remove_line(&ProductId::from(product.as_str()))?;
            receipt::write_cart(&mut out, session.cart().cart())?;
        }
        Command::Show => receipt::write_cart(&mut out, session.cart().cart())?,
        Command::Clear => {
            session.cart_mut().clear();
            writeln!(out, "Cart cleared")?;
        }
        Command::Login {
            token,
            name,
            email,
            id,
            phone,
            role,
        } => {
            let user = User {
                id: id.clone(),
                name: name.clone(),
                email: email.clone(),
                phone: phone.clone(),
                address: None,
                role: *role,
            };

            session.login(AuthRecord::new(user, token.as_str()))?;
            writeln!(out, "Logged in as {name}")?;
        }
        Command::Logout => {
            session.logout()?;
            writeln!(out, "Logged out")?;
        }
        Command::Checkout { redirect_url } => {
            let request = CheckoutRequest::build(
                session.cart().cart(),
                session.auth(),
                redirect_url.as_str(),
                Timestamp::now(),
                &mut rand::rng(),
            )?;

            serde_json::to_writer_pretty(&mut out, &request)?;
            writeln!(out)?;
        }
        Command::PaymentStatus { response } => {
            let response: Value =
                serde_json::from_str(response).context("invalid status response")?;

            match PaymentStatus::from_response(&response) {
                PaymentStatus::Charged => {
                    session.cart_mut().clear();
                    writeln!(out, "Payment successful! Thank you for your order.")?;
                }
                PaymentStatus::Failed(status) => {
                    writeln!(out, "Payment failed ({status}). Your cart has been kept.")?;
                }
                PaymentStatus::Pending => writeln!(out, "Payment pending")?,
            }
        }
        Command::Photos { .. } | Command::Catalog => {}
    }

    Ok(())
}

fn log_cart_events(store: &mut CartStore<FileStorage>) {
    store.subscribe(|event, cart| {
        info!(
            product = event.product_id().map(ProductId::as_str),
            lines = cart.len(),
            items = cart.item_count(),
            "cart updated"
        );
    });
}
