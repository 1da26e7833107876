//! Interactive shopping session.
//!
//! Reads one command per line from stdin. Category, rating, stock and search
//! changes apply immediately; price bounds go through [`PriceRange`] and are
//! committed only once typing has paused for the debounce delay.

use std::time::{Duration, Instant};

use bazaar_core::debounce::PriceRange;
use bazaar_core::{CategorySelection, FilterSpec};
use bazaar_storefront::catalog::CatalogProvider;
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::{CommandError, catalog::render_list, emit};

const HELP: &str = "\
Commands:
  min <amount>        set minimum price
  max <amount>        set maximum price
  category <name>     pick a category (\"all\" to reset)
  sub <name>          pick a subcategory of the current category
  rating <1-4>        toggle a minimum rating
  stock               toggle in-stock only
  search <text>       search within the filtered products (blank to reset)
  clear               reset every filter, keeping the search
  list                show the current results
  help                show this help
  quit                leave the session";

/// A parsed session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    MinPrice(Decimal),
    MaxPrice(Decimal),
    Category(CategorySelection),
    Subcategory(String),
    Rating(u8),
    InStock,
    Search(String),
    Clear,
    List,
    Help,
    Quit,
}

/// What the session loop should do after applying an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Filters changed; fetch and show results.
    Refresh,
    /// A price edit is waiting for the debounce deadline.
    Pending,
    Message(String),
    Quit,
}

/// Parse one input line.
///
/// # Errors
///
/// Returns a message to show the user when the line isn't a known command.
pub fn parse(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let (command, arg) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(command, arg)| (command, arg.trim()));

    let amount = |arg: &str| {
        arg.parse::<Decimal>()
            .map_err(|_| format!("Not a price: {arg:?}"))
    };

    match command.to_lowercase().as_str() {
        "" | "list" | "ls" => Ok(Input::List),
        "min" => amount(arg).map(Input::MinPrice),
        "max" => amount(arg).map(Input::MaxPrice),
        "category" | "cat" => Ok(Input::Category(CategorySelection::from(
            if arg.eq_ignore_ascii_case("all") { "" } else { arg },
        ))),
        "sub" | "subcategory" if !arg.is_empty() => Ok(Input::Subcategory(arg.to_string())),
        "rating" => match arg.parse::<u8>() {
            Ok(stars @ 1..=4) => Ok(Input::Rating(stars)),
            _ => Err(format!("Rating must be 1 to 4, got {arg:?}")),
        },
        "stock" => Ok(Input::InStock),
        "search" | "s" => Ok(Input::Search(arg.to_string())),
        "clear" => Ok(Input::Clear),
        "help" | "?" => Ok(Input::Help),
        "quit" | "exit" | "q" => Ok(Input::Quit),
        _ => Err(format!("Unknown command: {line:?} (type \"help\")")),
    }
}

/// Browsing state for one interactive session.
#[derive(Debug)]
pub struct Session {
    spec: FilterSpec,
    search: Option<String>,
    price: PriceRange,
    delay: Duration,
}

impl Session {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        let spec = FilterSpec::default();
        Self {
            price: PriceRange::from_spec(&spec, delay),
            spec,
            search: None,
            delay,
        }
    }

    #[must_use]
    pub const fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// When a pending price edit becomes due.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.price.deadline()
    }

    /// Commit a due price edit. Returns whether the filters changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        self.price.poll_into(&mut self.spec, now)
    }

    pub fn apply(&mut self, input: Input, now: Instant) -> Outcome {
        match input {
            Input::MinPrice(min) => {
                self.price.set_min(min, now);
                Outcome::Pending
            }
            Input::MaxPrice(max) => {
                self.price.set_max(max, now);
                Outcome::Pending
            }
            Input::Category(category) => {
                self.spec.select_category(category, None);
                Outcome::Refresh
            }
            Input::Subcategory(sub) => {
                if self.spec.category.is_all() {
                    return Outcome::Message("Pick a category first".to_string());
                }
                let category = self.spec.category.clone();
                self.spec.select_category(category, Some(sub));
                Outcome::Refresh
            }
            Input::Rating(stars) => {
                self.spec.toggle_min_rating(f64::from(stars));
                Outcome::Refresh
            }
            Input::InStock => {
                self.spec.toggle_in_stock();
                Outcome::Refresh
            }
            Input::Search(query) => {
                self.search = Some(query).filter(|q| !q.trim().is_empty());
                Outcome::Refresh
            }
            Input::Clear => {
                self.spec.clear();
                self.price = PriceRange::from_spec(&self.spec, self.delay);
                Outcome::Refresh
            }
            Input::List => Outcome::Refresh,
            Input::Help => Outcome::Message(HELP.to_string()),
            Input::Quit => Outcome::Quit,
        }
    }
}

/// Run the session until stdin closes or the user quits.
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
pub async fn run(catalog: &dyn CatalogProvider, delay: Duration) -> Result<(), CommandError> {
    let mut session = Session::new(delay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    emit(HELP);
    show(catalog, &session).await;

    loop {
        let deadline = session.deadline();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse(&line) {
                    Ok(input) => match session.apply(input, Instant::now()) {
                        Outcome::Refresh => show(catalog, &session).await,
                        Outcome::Pending => {
                            debug!(deadline = ?session.deadline(), "Price edit pending");
                        }
                        Outcome::Message(text) => emit(&text),
                        Outcome::Quit => break,
                    },
                    Err(message) => emit(&message),
                }
            }
            () = wait_until(deadline) => {
                if session.poll(Instant::now()) {
                    show(catalog, &session).await;
                }
            }
        }
    }

    Ok(())
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

/// Print results for the current filters. Catalog failures are reported and
/// the session carries on, so `list` acts as a retry.
async fn show(catalog: &dyn CatalogProvider, session: &Session) {
    match catalog.browse(session.spec(), session.search()).await {
        Ok(products) => emit(&render_list(&products)),
        Err(e) => emit(&format!("Couldn't load products: {e}. Type \"list\" to try again.")),
    }
}
