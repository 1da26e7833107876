//! Bazaar CLI - catalog browsing and cart management from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # List products, optionally filtered and searched
//! bazaar products --category Electronics --min-rating 4 --in-stock
//! bazaar products --search mug
//!
//! # Show one product
//! bazaar product 7
//!
//! # Manage the cart shared with the storefront
//! bazaar cart add 7 --quantity 2
//! bazaar cart update 7 3
//! bazaar cart remove 7
//! bazaar cart show
//!
//! # Interactive session with a debounced price range
//! bazaar shop
//! ```
//!
//! Configuration comes from the same environment as the storefront
//! (`CATALOG_URL` / `CATALOG_FIXTURE_DIR`, `BAZAAR_DATA_DIR`,
//! `PRICE_DEBOUNCE_MS`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use bazaar_core::FilterSpec;
use bazaar_storefront::config::StorefrontConfig;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Bazaar catalog and cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products(ProductArgs),
    /// Show a single product
    Product {
        /// Product ID
        id: i32,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Interactive shopping session
    Shop,
}

#[derive(Args)]
struct ProductArgs {
    /// Only this category
    #[arg(short, long)]
    category: Option<String>,

    /// Only this subcategory (requires --category)
    #[arg(long, requires = "category")]
    subcategory: Option<String>,

    /// Minimum selling price
    #[arg(long)]
    min_price: Option<Decimal>,

    /// Maximum selling price
    #[arg(long)]
    max_price: Option<Decimal>,

    /// Minimum rating (1-5)
    #[arg(long)]
    min_rating: Option<f64>,

    /// Hide out of stock products
    #[arg(long)]
    in_stock: bool,

    /// Free-text search over title, description and category
    #[arg(short, long)]
    search: Option<String>,
}

impl ProductArgs {
    fn filter_spec(&self) -> FilterSpec {
        let mut spec = FilterSpec::default();
        if let Some(category) = &self.category {
            spec.select_category(category.as_str(), self.subcategory.clone());
        }
        spec.set_price_range(self.min_price, self.max_price);
        spec.min_rating = self.min_rating;
        spec.in_stock_only = self.in_stock;
        spec
    }
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and totals
    Show,
    /// Add a product to the cart
    Add {
        /// Product ID
        id: i32,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a cart line (minimum 1)
    Update {
        /// Product ID
        id: i32,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: i32,
    },
    /// Empty the cart
    Clear,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let config = StorefrontConfig::from_env()?;

    match cli.command {
        Commands::Products(args) => {
            let catalog = commands::open_catalog(&config)?;
            let spec = args.filter_spec();
            let output =
                commands::catalog::list(catalog.as_ref(), &spec, args.search.as_deref()).await?;
            commands::emit(&output);
        }
        Commands::Product { id } => {
            let catalog = commands::open_catalog(&config)?;
            commands::emit(&commands::catalog::show(catalog.as_ref(), id).await?);
        }
        Commands::Cart { action } => {
            let mut store = commands::open_cart(&config)?;
            let output = match action {
                CartAction::Show => commands::cart::render(store.cart()),
                CartAction::Add { id, quantity } => {
                    let catalog = commands::open_catalog(&config)?;
                    commands::cart::add(&mut store, catalog.as_ref(), id, quantity).await?
                }
                CartAction::Update { id, quantity } => {
                    commands::cart::update(&mut store, id, quantity)?
                }
                CartAction::Remove { id } => commands::cart::remove(&mut store, id)?,
                CartAction::Clear => commands::cart::clear(&mut store)?,
            };
            commands::emit(&output);
        }
        Commands::Shop => {
            let catalog = commands::open_catalog(&config)?;
            commands::shop::run(catalog.as_ref(), config.price_debounce).await?;
        }
    }
    Ok(())
}
