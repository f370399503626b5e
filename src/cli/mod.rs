pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vitrine")]
#[command(about = "Gift registry offer acquisition and aggregation", long_about = None)]
pub struct Cli {
    /// SQLite database to use instead of the configured one
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Config file to use instead of ~/.config/vitrine/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch and extract a product page without saving anything
    Extract {
        /// Product page URL
        url: String,
    },
    /// Create one gift per product link
    Import {
        /// Registry the gifts belong to
        #[arg(short, long)]
        registry: String,

        /// Category assigned to every imported gift
        #[arg(short, long)]
        category: Option<String>,

        /// File with one or more links per line (`#` starts a comment)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print outcomes as JSON
        #[arg(long)]
        json: bool,

        /// Product page URLs
        urls: Vec<String>,
    },
    /// Add another merchant's offer to an existing gift
    AddOffer {
        gift_id: i64,
        /// Product page URL
        url: String,
    },
    /// Re-fetch an offer's page and update its price
    Refresh { offer_id: i64 },
    /// Delete an offer
    Remove { offer_id: i64 },
    /// List a registry's gifts with their best price
    Gifts {
        /// Registry to list
        registry: String,
    },
    /// List a gift's offers with recent prices and clicks
    Offers { gift_id: i64 },
    /// Show the latest clicks on a gift's offers
    Clicks {
        gift_id: i64,

        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Record a click on an offer and print its destination
    Click {
        gift_id: i64,
        offer_id: i64,

        #[arg(long)]
        ip: Option<String>,

        #[arg(long)]
        user_agent: Option<String>,
    },
}
