use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Normalized snapshot of a product page, as produced by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedProduct {
    pub title: String,
    pub description: Option<String>,
    /// First entry of `images`, kept separately for convenience.
    pub image_url: Option<String>,
    pub images: Vec<String>,
    pub price_cents: Option<i64>,
    pub currency: Option<String>,
    pub canonical_url: String,
    /// URL the page was actually served from, after redirects.
    pub final_url: String,
    /// Advisory metadata (brand, sku, gtin, ...). Never required.
    pub attributes: BTreeMap<String, String>,
}

impl ExtractedProduct {
    pub fn new(title: impl Into<String>, page_url: impl Into<String>) -> Self {
        let page_url = page_url.into();
        Self {
            title: title.into(),
            description: None,
            image_url: None,
            images: Vec::new(),
            price_cents: None,
            currency: None,
            canonical_url: page_url.clone(),
            final_url: page_url,
            attributes: BTreeMap::new(),
        }
    }
}
