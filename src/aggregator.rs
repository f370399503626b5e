//! Offer lifecycle and best-offer selection.
//!
//! Every mutation of a gift's offer set runs in one [`Store::atomically`]
//! call that ends with [`recompute_best_offer`], so the gift's primary offer
//! and mirrored price are never observed out of date. Network work happens
//! before the transaction opens.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use url::Url;

use crate::app::{Result, VitrineError};
use crate::domain::{
    ExtractedProduct, Gift, GiftPricing, GiftTarget, NewGift, NewOffer, Offer, OfferSnapshot,
};
use crate::merchant::{resolve_store, resolve_store_for_url};
use crate::pipeline::Acquirer;
use crate::store::{Records, Store};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedGift {
    pub gift_id: i64,
    pub offer_id: i64,
    pub title: String,
}

pub struct OfferAggregator<S> {
    store: Arc<S>,
    acquirer: Acquirer,
}

impl<S> Clone for OfferAggregator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            acquirer: self.acquirer.clone(),
        }
    }
}

impl<S: Store> OfferAggregator<S> {
    pub fn new(store: Arc<S>, acquirer: Acquirer) -> Self {
        Self { store, acquirer }
    }

    /// Create a gift together with its primary offer from an already
    /// extracted product. The offer points at the page's final URL.
    pub fn create_gift_with_offer(
        &self,
        target: &GiftTarget,
        product: &ExtractedProduct,
    ) -> Result<CreatedGift> {
        self.create_with_source(target, &product.final_url, product)
    }

    pub async fn create_gift_from_url(&self, target: &GiftTarget, url: &str) -> Result<CreatedGift> {
        let url = url.trim();
        let product = self.acquirer.acquire(url).await?;
        self.create_with_source(target, url, &product)
    }

    /// Attach a non-primary offer to an existing gift, then reselect the best
    /// offer.
    pub fn add_offer(&self, gift_id: i64, product: &ExtractedProduct) -> Result<Offer> {
        self.add_with_source(gift_id, &product.final_url, product)
    }

    pub async fn add_offer_from_url(&self, gift_id: i64, url: &str) -> Result<Offer> {
        if self.store.read(|r| r.get_gift(gift_id))?.is_none() {
            return Err(gift_not_found(gift_id));
        }

        let url = url.trim();
        let product = self.acquirer.acquire(url).await?;
        self.add_with_source(gift_id, url, &product)
    }

    /// Re-fetch an offer's stored URL and overwrite its snapshot in place.
    /// A failed fetch or extraction leaves the offer untouched.
    pub async fn refresh_offer(&self, offer_id: i64) -> Result<Offer> {
        let offer = self
            .store
            .read(|r| r.get_offer(offer_id))?
            .ok_or_else(|| offer_not_found(offer_id))?;

        let product = self.acquirer.acquire(&offer.url).await?;
        let snapshot = snapshot_for(&product);
        let checked_at = Utc::now();

        let refreshed = self.store.atomically(|records| {
            let current = records
                .get_offer(offer_id)?
                .ok_or_else(|| offer_not_found(offer_id))?;

            records.update_offer_snapshot(offer_id, &snapshot, checked_at)?;
            if let Some(price) = snapshot.price_cents {
                records.append_price(offer_id, price, &snapshot.currency, checked_at)?;
            }
            recompute_best_offer(records, current.gift_id)?;

            records
                .get_offer(offer_id)?
                .ok_or_else(|| offer_not_found(offer_id))
        })?;

        tracing::info!(
            "Refreshed offer {} ({}): price {:?}",
            offer_id,
            refreshed.store_name,
            refreshed.price_cents
        );

        Ok(refreshed)
    }

    /// Delete an offer. Returns the gift's new primary offer, if any remain.
    pub fn remove_offer(&self, offer_id: i64) -> Result<Option<i64>> {
        let (gift_id, primary) = self.store.atomically(|records| {
            let offer = records
                .get_offer(offer_id)?
                .ok_or_else(|| offer_not_found(offer_id))?;

            records.delete_offer(offer_id)?;
            let primary = recompute_best_offer(records, offer.gift_id)?;
            Ok((offer.gift_id, primary))
        })?;

        tracing::info!(
            "Removed offer {} from gift {} (primary now {:?})",
            offer_id,
            gift_id,
            primary
        );

        Ok(primary)
    }

    /// A registry's gifts in creation order, with their mirrored best price.
    pub fn registry_gifts(&self, registry_id: &str) -> Result<Vec<Gift>> {
        self.store.read(|r| r.gifts_for_registry(registry_id))
    }

    fn create_with_source(
        &self,
        target: &GiftTarget,
        source_url: &str,
        product: &ExtractedProduct,
    ) -> Result<CreatedGift> {
        let snapshot = snapshot_for(product);
        let now = Utc::now();

        let created = self.store.atomically(|records| {
            let mut gift = NewGift::from_product(target, product);
            gift.created_at = now;
            let gift_id = records.insert_gift(&gift)?;

            let offer_id = records.insert_offer(&NewOffer {
                gift_id,
                url: source_url.to_string(),
                is_primary: true,
                snapshot: snapshot.clone(),
                created_at: now,
            })?;

            if let Some(price) = snapshot.price_cents {
                records.append_price(offer_id, price, &snapshot.currency, now)?;
            }

            // The only offer is the best one.
            records.set_gift_pricing(
                gift_id,
                Some(&GiftPricing {
                    offer_id,
                    price_cents: snapshot.price_cents,
                    currency: snapshot.currency.clone(),
                }),
            )?;

            Ok(CreatedGift {
                gift_id,
                offer_id,
                title: gift.title,
            })
        })?;

        tracing::info!(
            "Created gift {} with offer {} from {}",
            created.gift_id,
            created.offer_id,
            snapshot.store_name
        );

        Ok(created)
    }

    fn add_with_source(
        &self,
        gift_id: i64,
        source_url: &str,
        product: &ExtractedProduct,
    ) -> Result<Offer> {
        let snapshot = snapshot_for(product);
        let now = Utc::now();

        let offer = self.store.atomically(|records| {
            if records.get_gift(gift_id)?.is_none() {
                return Err(gift_not_found(gift_id));
            }

            let offer_id = records.insert_offer(&NewOffer {
                gift_id,
                url: source_url.to_string(),
                is_primary: false,
                snapshot: snapshot.clone(),
                created_at: now,
            })?;

            if let Some(price) = snapshot.price_cents {
                records.append_price(offer_id, price, &snapshot.currency, now)?;
            }
            recompute_best_offer(records, gift_id)?;

            records
                .get_offer(offer_id)?
                .ok_or_else(|| offer_not_found(offer_id))
        })?;

        tracing::info!(
            "Added offer {} to gift {} from {} (primary: {})",
            offer.id,
            gift_id,
            offer.store_name,
            offer.is_primary
        );

        Ok(offer)
    }
}

/// Pick the gift's best offer and mirror it onto the gift.
///
/// The cheapest priced offer wins, ties going to the earliest created. When no
/// offer has a price the earliest offer is used. With no offers at all the
/// gift's primary reference and price are cleared.
pub(crate) fn recompute_best_offer(records: &dyn Records, gift_id: i64) -> Result<Option<i64>> {
    // Already sorted cheapest first with unknown prices last.
    let offers = records.offers_by_price(gift_id)?;

    let Some(best) = offers.first() else {
        records.set_gift_pricing(gift_id, None)?;
        tracing::debug!("Gift {} has no offers left", gift_id);
        return Ok(None);
    };

    records.set_primary_offer(gift_id, best.id)?;
    records.set_gift_pricing(
        gift_id,
        Some(&GiftPricing {
            offer_id: best.id,
            price_cents: best.price_cents,
            currency: best.currency.clone(),
        }),
    )?;

    tracing::debug!(
        "Gift {} primary offer is {} at {:?}",
        gift_id,
        best.id,
        best.price_cents
    );

    Ok(Some(best.id))
}

/// Merchant is taken from the host the page was actually served from.
fn snapshot_for(product: &ExtractedProduct) -> OfferSnapshot {
    let store = match Url::parse(&product.final_url) {
        Ok(url) => resolve_store_for_url(&url),
        Err(_) => resolve_store(&product.final_url),
    };
    OfferSnapshot::from_product(product, store)
}

fn gift_not_found(gift_id: i64) -> VitrineError {
    VitrineError::NotFound(format!("gift {gift_id}"))
}

fn offer_not_found(offer_id: i64) -> VitrineError {
    VitrineError::NotFound(format!("offer {offer_id}"))
}
