use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ExtractedProduct;

/// A registry item. `price_cents`, `currency` and `primary_offer_id` mirror
/// the current best offer and are only written by the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gift {
    pub id: i64,
    pub registry_id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub currency: Option<String>,
    pub primary_offer_id: Option<i64>,
    pub desired_quantity: i64,
    pub allow_contributions: bool,
    pub created_at: DateTime<Utc>,
}

/// Where a newly imported gift should land and how the registry configures it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftTarget {
    pub registry_id: String,
    pub category: Option<String>,
    pub desired_quantity: i64,
    pub allow_contributions: bool,
}

impl GiftTarget {
    pub fn new(registry_id: impl Into<String>) -> Self {
        Self {
            registry_id: registry_id.into(),
            category: None,
            desired_quantity: 1,
            allow_contributions: false,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct NewGift {
    pub registry_id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub desired_quantity: i64,
    pub allow_contributions: bool,
    pub created_at: DateTime<Utc>,
}

impl NewGift {
    /// Display fields come from the product page; configuration from the target.
    pub fn from_product(target: &GiftTarget, product: &ExtractedProduct) -> Self {
        Self {
            registry_id: target.registry_id.clone(),
            title: product.title.clone(),
            description: product.description.clone(),
            image_url: product.image_url.clone(),
            category: target.category.clone(),
            desired_quantity: target.desired_quantity.max(1),
            allow_contributions: target.allow_contributions,
            created_at: Utc::now(),
        }
    }
}

/// Denormalized pricing written back onto a gift after best-offer selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftPricing {
    pub offer_id: i64,
    pub price_cents: Option<i64>,
    pub currency: String,
}
