//! Outbound click recording and the per-gift offer listing.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::app::{Result, VitrineError};
use crate::domain::{ClickEvent, NewClick, Offer, PriceHistoryEntry};
use crate::store::Store;

/// Trailing window for click counts.
pub const CLICK_WINDOW_DAYS: i64 = 30;

/// Most recent price observations returned per offer.
pub const PRICE_HISTORY_LIMIT: usize = 30;

#[derive(Debug, Clone, Serialize)]
pub struct OfferListing {
    pub offer: Offer,
    /// Newest first.
    pub price_history: Vec<PriceHistoryEntry>,
    pub clicks_30d: i64,
}

pub struct ClickTracker<S> {
    store: Arc<S>,
}

impl<S> Clone for ClickTracker<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> ClickTracker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record a visitor following `offer_id` and return where to send them.
    ///
    /// The offer must belong to `gift_id`; otherwise nothing is recorded.
    pub fn record_click(
        &self,
        gift_id: i64,
        offer_id: i64,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<String> {
        let destination = self.store.atomically(|records| {
            let offer = records
                .get_offer(offer_id)?
                .filter(|offer| offer.gift_id == gift_id)
                .ok_or(VitrineError::InvalidOffer { gift_id, offer_id })?;

            records.insert_click(&NewClick {
                gift_id,
                offer_id,
                ip: ip.map(str::to_string),
                user_agent: user_agent.map(str::to_string),
                clicked_at: Utc::now(),
            })?;

            Ok(offer.destination_url().to_string())
        })?;

        tracing::debug!("Click on offer {} of gift {}", offer_id, gift_id);
        Ok(destination)
    }

    /// The latest clicks on a gift's offers, newest first.
    pub fn recent_clicks(&self, gift_id: i64, limit: usize) -> Result<Vec<ClickEvent>> {
        self.store.read(|records| {
            if records.get_gift(gift_id)?.is_none() {
                return Err(VitrineError::NotFound(format!("gift {gift_id}")));
            }
            records.recent_clicks(gift_id, limit)
        })
    }

    /// Every offer of a gift, primary first, then cheapest, then oldest.
    pub fn list_offers(&self, gift_id: i64) -> Result<Vec<OfferListing>> {
        let since = Utc::now() - Duration::days(CLICK_WINDOW_DAYS);

        self.store.read(|records| {
            if records.get_gift(gift_id)?.is_none() {
                return Err(VitrineError::NotFound(format!("gift {gift_id}")));
            }

            let clicks = records.click_counts_since(gift_id, since)?;
            records
                .offers_for_display(gift_id)?
                .into_iter()
                .map(|offer| {
                    Ok(OfferListing {
                        price_history: records.price_history(offer.id, PRICE_HISTORY_LIMIT)?,
                        clicks_30d: clicks.get(&offer.id).copied().unwrap_or(0),
                        offer,
                    })
                })
                .collect()
        })
    }
}
