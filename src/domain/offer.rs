use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ExtractedProduct, DEFAULT_CURRENCY};
use crate::merchant::StoreInfo;

/// One merchant's purchase option for a gift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: i64,
    pub gift_id: i64,
    pub store_name: String,
    pub domain: String,
    pub title: String,
    pub url: String,
    pub canonical_url: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: Option<i64>,
    pub currency: String,
    pub is_primary: bool,
    pub attributes: BTreeMap<String, String>,
    pub last_checked_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Offer {
    /// Where a click on this offer should send the visitor.
    pub fn destination_url(&self) -> &str {
        self.canonical_url.as_deref().unwrap_or(&self.url)
    }
}

/// The fields of an offer that are (re)written from a fresh extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferSnapshot {
    pub store_name: String,
    pub domain: String,
    pub title: String,
    pub canonical_url: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: Option<i64>,
    pub currency: String,
    pub attributes: BTreeMap<String, String>,
}

impl OfferSnapshot {
    pub fn from_product(product: &ExtractedProduct, store: StoreInfo) -> Self {
        Self {
            store_name: store.store_name,
            domain: store.domain,
            title: product.title.clone(),
            canonical_url: Some(product.canonical_url.clone()),
            image_url: product.image_url.clone(),
            price_cents: product.price_cents,
            currency: product
                .currency
                .clone()
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            attributes: product.attributes.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewOffer {
    pub gift_id: i64,
    pub url: String,
    pub is_primary: bool,
    pub snapshot: OfferSnapshot,
    pub created_at: DateTime<Utc>,
}
