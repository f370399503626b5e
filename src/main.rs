use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vitrine::app::AppContext;
use vitrine::cli::{commands, Cli, Commands};
use vitrine::config::Config;
use vitrine::domain::GiftTarget;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(db) = cli.db {
        config.database.path = Some(db);
    }

    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Extract { url } => {
            commands::extract(&ctx, &url).await?;
        }
        Commands::Import {
            registry,
            category,
            file,
            json,
            urls,
        } => {
            let mut target = GiftTarget::new(registry);
            target.category = category;
            commands::import(&ctx, &target, file.as_deref(), &urls, json).await?;
        }
        Commands::AddOffer { gift_id, url } => {
            commands::add_offer(&ctx, gift_id, &url).await?;
        }
        Commands::Refresh { offer_id } => {
            commands::refresh(&ctx, offer_id).await?;
        }
        Commands::Remove { offer_id } => {
            commands::remove(&ctx, offer_id)?;
        }
        Commands::Gifts { registry } => {
            commands::list_gifts(&ctx, &registry)?;
        }
        Commands::Offers { gift_id } => {
            commands::list_offers(&ctx, gift_id)?;
        }
        Commands::Clicks { gift_id, limit } => {
            commands::list_clicks(&ctx, gift_id, limit)?;
        }
        Commands::Click {
            gift_id,
            offer_id,
            ip,
            user_agent,
        } => {
            commands::click(&ctx, gift_id, offer_id, ip.as_deref(), user_agent.as_deref())?;
        }
    }

    Ok(())
}
