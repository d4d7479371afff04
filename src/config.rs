//! Configuration
//!
//! Settings shared by every `storefront` command. Each one can be given on
//! the command line or through the environment, and a `.env` file in the
//! working directory is loaded first.

use std::path::PathBuf;

use clap::Args;
use rusty_money::iso::Currency;

use crate::{
    cart::MergePolicy,
    catalog::{Catalog, CatalogError, find_currency},
    session::Session,
    storage::{FileStorage, StorageError},
};

/// Log output format.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    #[default]
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(
        long,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact,
        global = true
    )]
    pub log_format: LogFormat,
}

/// Storefront settings.
#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// Directory the cart and auth records are stored in
    #[arg(long, env = "STOREFRONT_DATA_DIR", default_value = ".storefront", global = true)]
    pub data_dir: PathBuf,

    /// Product catalogue (YAML)
    #[arg(
        long,
        env = "STOREFRONT_CATALOG",
        default_value = "fixtures/products/storefront.yml",
        global = true
    )]
    pub catalog: PathBuf,

    /// What adding an identical product and variant does
    #[arg(
        long,
        env = "STOREFRONT_MERGE_POLICY",
        value_enum,
        default_value_t = MergePolicy::MergeIdentical,
        global = true
    )]
    pub merge_policy: MergePolicy,

    /// ISO 4217 currency prices are in, unless the catalogue names one
    #[arg(long, env = "STOREFRONT_CURRENCY", default_value = "INR", global = true)]
    pub currency: String,
}

impl StoreConfig {
    /// Configured currency.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownCurrency`] for an unrecognised code.
    pub fn currency(&self) -> Result<&'static Currency, CatalogError> {
        find_currency(&self.currency)
    }

    /// Load the configured catalogue.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the file cannot be read or is invalid.
    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        Catalog::load(&self.catalog, self.currency()?)
    }

    /// Open a session over the configured data directory, pricing the cart in
    /// `currency`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the data directory cannot be created.
    pub fn open_session(
        &self,
        currency: &'static Currency,
    ) -> Result<Session<FileStorage>, StorageError> {
        let storage = FileStorage::open(&self.data_dir)?;

        Ok(Session::open(storage, currency, self.merge_policy))
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use clap::Parser;
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        store: StoreConfig,

        #[command(flatten)]
        logging: LoggingConfig,
    }

    #[test]
    fn flags_override_defaults() -> TestResult {
        let cli = TestCli::try_parse_from([
            "storefront",
            "--data-dir",
            "/tmp/shop",
            "--merge-policy",
            "append",
            "--currency",
            "USD",
            "--log-format",
            "json",
        ])?;

        assert_eq!(cli.store.data_dir, PathBuf::from("/tmp/shop"));
        assert_eq!(cli.store.merge_policy, MergePolicy::Append);
        assert_eq!(cli.store.currency()?, USD);
        assert!(matches!(cli.logging.log_format, LogFormat::Json));

        Ok(())
    }

    #[test]
    fn unknown_currency_is_reported() -> TestResult {
        let cli = TestCli::try_parse_from(["storefront", "--currency", "XYZ"])?;

        assert!(matches!(
            cli.store.currency(),
            Err(CatalogError::UnknownCurrency(code)) if code == "XYZ"
        ));

        Ok(())
    }

    #[test]
    fn open_session_creates_data_dir() -> TestResult {
        let dir = tempfile::tempdir()?;
        let data_dir = dir.path().join("nested");

        let cli = TestCli::try_parse_from([
            OsStr::new("storefront"),
            OsStr::new("--data-dir"),
            data_dir.as_os_str(),
        ])?;

        let session = cli.store.open_session(cli.store.currency()?)?;

        assert!(data_dir.is_dir());
        assert!(session.cart().cart().is_empty());

        Ok(())
    }
}
