//! Command implementations.
//!
//! Commands return the text to print rather than printing it, so tests can
//! assert on output without capturing stdout.

pub mod cart;
pub mod catalog;
pub mod shop;

use std::sync::Arc;

use bazaar_core::{CartError, CartStore, StorageError};
use bazaar_storefront::catalog::{self as provider, CatalogError, CatalogProvider, FixtureLoadError};
use bazaar_storefront::config::{ConfigError, StorefrontConfig};
use bazaar_storefront::storage::FileStorage;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Bundled catalog could not be loaded.
    #[error("Fixture error: {0}")]
    Fixture(#[from] FixtureLoadError),

    /// Catalog request failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Cart could not be persisted.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Cart storage could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The command was well-formed but cannot be carried out.
    #[error("{0}")]
    Rejected(String),
}

/// Open the configured catalog backend.
pub fn open_catalog(config: &StorefrontConfig) -> Result<Arc<dyn CatalogProvider>, CommandError> {
    Ok(provider::from_source(&config.catalog)?)
}

/// Open the cart persisted under the configured data directory.
pub fn open_cart(config: &StorefrontConfig) -> Result<CartStore<FileStorage>, CommandError> {
    let storage = FileStorage::open(config.data_dir.clone())?;
    Ok(CartStore::open(storage))
}

/// Write command output to stdout.
pub fn emit(output: &str) {
    #[allow(clippy::print_stdout)]
    {
        println!("{output}");
    }
}
