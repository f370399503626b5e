//! # Vitrine
//!
//! Offer acquisition and aggregation for a gift registry.
//!
//! ## Architecture
//!
//! Creation flows one way:
//!
//! ```text
//! URL → Fetcher → Extractor → Aggregator → Store
//! ```
//!
//! Refresh follows the same path for an existing offer. Click tracking is a
//! side channel that reads offer identity and appends an event.
//!
//! ## Quick Start
//!
//! ```bash
//! # Preview what would be extracted from a page
//! vitrine extract https://www.amazon.com.br/dp/B0EXAMPLE
//!
//! # Create gifts from a list of links
//! vitrine import --registry wedding-42 --file links.txt
//!
//! # Add a second merchant to gift 1, then inspect it
//! vitrine add-offer 1 https://www.magazineluiza.com.br/p/example
//! vitrine offers 1
//! ```
//!
//! ## Modules
//!
//! - [`app`]: Application context and error types
//! - [`aggregator`]: Offer lifecycle and best-offer selection
//! - [`clicks`]: Click recording and offer listings
//! - [`importer`]: Bulk link import
//! - [`domain`]: Gift, offer and activity records
//! - [`fetcher`]: Bounded HTTP page retrieval
//! - [`extractor`]: Product extraction from HTML
//! - [`merchant`]: Hostname to merchant lookup
//! - [`pipeline`]: Fetch-then-extract composition
//! - [`store`]: Database persistence

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// fetcher, extractor and services.
pub mod app;

/// Offer creation, refresh and removal with best-offer recomputation.
pub mod aggregator;

/// Command-line interface using clap.
///
/// - `extract <url>` - Dry-run extraction, printed as JSON
/// - `import --registry <id> [--file <path>] [urls...]` - Bulk import
/// - `add-offer <gift> <url>` - Add a merchant offer to a gift
/// - `refresh <offer>` - Re-fetch an offer
/// - `remove <offer>` - Delete an offer
/// - `offers <gift>` - List offers with price history and clicks
/// - `click <gift> <offer>` - Record a click
pub mod cli;

/// Outbound click events and the per-gift offer listing.
pub mod clicks;

/// Configuration loaded from `~/.config/vitrine/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Gift`](domain::Gift): Registry item with a mirrored best price
/// - [`Offer`](domain::Offer): One merchant's purchase option
/// - [`ExtractedProduct`](domain::ExtractedProduct): Normalized page snapshot
pub mod domain;

/// Layered product extraction: JSON-LD, then meta tags, then raw HTML.
pub mod extractor;

/// HTTP fetching with time and size bounds.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for page retrieval
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Sequential bulk import that never aborts on a single bad link.
pub mod importer;

/// Supported-retailer table.
pub mod merchant;

pub mod pipeline;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Transaction boundary
/// - [`Records`](store::Records): Storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
