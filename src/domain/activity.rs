use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only price observation for one offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    pub id: i64,
    pub offer_id: i64,
    pub price_cents: i64,
    pub currency: String,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only record of a visitor following an offer link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickEvent {
    pub id: i64,
    pub gift_id: i64,
    pub offer_id: i64,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub clicked_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewClick {
    pub gift_id: i64,
    pub offer_id: i64,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub clicked_at: DateTime<Utc>,
}

impl NewClick {
    pub fn new(gift_id: i64, offer_id: i64) -> Self {
        Self {
            gift_id,
            offer_id,
            ip: None,
            user_agent: None,
            clicked_at: Utc::now(),
        }
    }
}
