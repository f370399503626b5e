use std::path::Path;

use crate::app::{AppContext, Result};
use crate::domain::{format_price, GiftTarget, Offer, DEFAULT_CURRENCY};
use crate::importer::parse_link_list;

pub async fn extract(ctx: &AppContext, url: &str) -> Result<()> {
    let product = ctx.acquirer.acquire(url).await?;
    println!("{}", serde_json::to_string_pretty(&product)?);
    Ok(())
}

pub async fn import(
    ctx: &AppContext,
    target: &GiftTarget,
    file: Option<&Path>,
    urls: &[String],
    json: bool,
) -> Result<()> {
    let urls = collect_urls(file, urls)?;
    if urls.is_empty() {
        println!("No links to import");
        return Ok(());
    }

    if !json {
        println!("Importing {} links...", urls.len());
    }

    let outcomes = ctx.importer.import_links(target, &urls).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
        return Ok(());
    }

    for outcome in &outcomes {
        if outcome.success {
            println!(
                "  ok    gift {} offer {}  {}",
                outcome.gift_id.unwrap_or_default(),
                outcome.offer_id.unwrap_or_default(),
                outcome.title.as_deref().unwrap_or_default()
            );
        } else {
            eprintln!(
                "  fail  {}  {}",
                outcome.url,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    let imported = outcomes.iter().filter(|o| o.success).count();
    println!(
        "Import complete: {} created, {} failed",
        imported,
        outcomes.len() - imported
    );
    Ok(())
}

pub async fn add_offer(ctx: &AppContext, gift_id: i64, url: &str) -> Result<()> {
    let offer = ctx.aggregator.add_offer_from_url(gift_id, url).await?;
    println!("Added offer {} to gift {}", offer.id, gift_id);
    print_offer(&offer, None);
    Ok(())
}

pub async fn refresh(ctx: &AppContext, offer_id: i64) -> Result<()> {
    let offer = ctx.aggregator.refresh_offer(offer_id).await?;
    println!("Refreshed offer {}", offer.id);
    print_offer(&offer, None);
    Ok(())
}

pub fn remove(ctx: &AppContext, offer_id: i64) -> Result<()> {
    match ctx.aggregator.remove_offer(offer_id)? {
        Some(primary) => println!("Removed offer {} (primary offer is now {})", offer_id, primary),
        None => println!("Removed offer {} (gift has no offers left)", offer_id),
    }
    Ok(())
}

pub fn list_gifts(ctx: &AppContext, registry_id: &str) -> Result<()> {
    let gifts = ctx.aggregator.registry_gifts(registry_id)?;

    if gifts.is_empty() {
        println!("No gifts in registry {}", registry_id);
        return Ok(());
    }

    for gift in &gifts {
        let currency = gift.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);
        println!(
            "[{}] {}  {}",
            gift.id,
            format_price(gift.price_cents, currency),
            gift.title
        );
    }

    Ok(())
}

pub fn list_offers(ctx: &AppContext, gift_id: i64) -> Result<()> {
    let listings = ctx.clicks.list_offers(gift_id)?;

    if listings.is_empty() {
        println!("No offers");
        return Ok(());
    }

    for listing in &listings {
        print_offer(&listing.offer, Some(listing.clicks_30d));
        for entry in listing.price_history.iter().take(5) {
            println!(
                "        {}  {}",
                entry.recorded_at.format("%Y-%m-%d %H:%M"),
                format_price(Some(entry.price_cents), &entry.currency)
            );
        }
    }

    Ok(())
}

pub fn list_clicks(ctx: &AppContext, gift_id: i64, limit: usize) -> Result<()> {
    let clicks = ctx.clicks.recent_clicks(gift_id, limit)?;

    if clicks.is_empty() {
        println!("No clicks");
        return Ok(());
    }

    for click in &clicks {
        println!(
            "{}  offer {}  {}  {}",
            click.clicked_at.format("%Y-%m-%d %H:%M"),
            click.offer_id,
            click.ip.as_deref().unwrap_or("-"),
            click.user_agent.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

pub fn click(
    ctx: &AppContext,
    gift_id: i64,
    offer_id: i64,
    ip: Option<&str>,
    user_agent: Option<&str>,
) -> Result<()> {
    let destination = ctx.clicks.record_click(gift_id, offer_id, ip, user_agent)?;
    println!("{}", destination);
    Ok(())
}

fn print_offer(offer: &Offer, clicks: Option<i64>) {
    let marker = if offer.is_primary { "*" } else { " " };
    let clicks = clicks
        .map(|n| format!("  ({} clicks/30d)", n))
        .unwrap_or_default();
    println!(
        "{} [{}] {}  {}  {}{}",
        marker,
        offer.id,
        offer.store_name,
        format_price(offer.price_cents, &offer.currency),
        offer.title,
        clicks
    );
}

/// Links from `--file` first, then the positional arguments.
fn collect_urls(file: Option<&Path>, urls: &[String]) -> Result<Vec<String>> {
    let mut all = match file {
        Some(path) => parse_link_list(&std::fs::read_to_string(path)?),
        None => Vec::new(),
    };
    all.extend(urls.iter().map(|u| u.trim().to_string()).filter(|u| !u.is_empty()));
    Ok(all)
}
