pub mod sqlite;

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::app::Result;
use crate::domain::{
    ClickEvent, Gift, GiftPricing, NewClick, NewGift, NewOffer, Offer, OfferSnapshot,
    PriceHistoryEntry,
};

pub use sqlite::SqliteStore;

/// Persistence boundary: an atomic multi-step commit capability over
/// [`Records`].
pub trait Store {
    /// Run `f` outside any explicit transaction. Meant for reads: a write made
    /// through `read` commits on its own, so several of them are not atomic.
    /// Use [`Store::atomically`] for anything that writes.
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Records) -> Result<T>;

    /// Run `f` inside one transaction. Everything `f` wrote is committed if it
    /// returns `Ok`, and nothing is if it returns `Err`.
    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Records) -> Result<T>;
}

pub trait Records {
    // Gift operations
    fn insert_gift(&self, gift: &NewGift) -> Result<i64>;
    fn get_gift(&self, id: i64) -> Result<Option<Gift>>;
    /// Oldest first. Backs the operator's registry listing.
    fn gifts_for_registry(&self, registry_id: &str) -> Result<Vec<Gift>>;
    /// Mirror the best offer onto the gift, or clear it with `None`.
    fn set_gift_pricing(&self, gift_id: i64, pricing: Option<&GiftPricing>) -> Result<()>;

    // Offer operations
    fn insert_offer(&self, offer: &NewOffer) -> Result<i64>;
    fn get_offer(&self, id: i64) -> Result<Option<Offer>>;
    fn update_offer_snapshot(
        &self,
        id: i64,
        snapshot: &OfferSnapshot,
        checked_at: DateTime<Utc>,
    ) -> Result<()>;
    fn delete_offer(&self, id: i64) -> Result<bool>;
    /// Cheapest first, unknown prices last, then creation order.
    fn offers_by_price(&self, gift_id: i64) -> Result<Vec<Offer>>;
    /// Primary first, then as [`Records::offers_by_price`].
    fn offers_for_display(&self, gift_id: i64) -> Result<Vec<Offer>>;
    /// Clear `is_primary` on every offer of the gift, then set it on one.
    fn set_primary_offer(&self, gift_id: i64, offer_id: i64) -> Result<()>;

    // Price history operations
    fn append_price(
        &self,
        offer_id: i64,
        price_cents: i64,
        currency: &str,
        recorded_at: DateTime<Utc>,
    ) -> Result<i64>;
    /// Newest first.
    fn price_history(&self, offer_id: i64, limit: usize) -> Result<Vec<PriceHistoryEntry>>;

    // Click operations
    fn insert_click(&self, click: &NewClick) -> Result<i64>;
    /// Newest first. Backs the operator's click log; the offer listing uses
    /// [`Records::click_counts_since`] instead.
    fn recent_clicks(&self, gift_id: i64, limit: usize) -> Result<Vec<ClickEvent>>;
    /// Clicks per offer of a gift at or after `since`.
    fn click_counts_since(&self, gift_id: i64, since: DateTime<Utc>) -> Result<HashMap<i64, i64>>;
}
