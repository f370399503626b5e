//! Product extraction from arbitrary retail pages.
//!
//! Tiers run in priority order over a single draft record, and each tier only
//! fills what the tiers before it left empty:
//!
//! ```text
//! canonical link → JSON-LD Product → meta tags → <title>/<img> fallback
//! ```

mod fallback;
mod meta;
mod structured;
pub mod text;

use std::collections::BTreeMap;

use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

use crate::app::{Result, VitrineError};
use crate::domain::ExtractedProduct;

use meta::MetaTags;
use text::{clean_text, normalize_currency, resolve_url};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// How many `<img>` tags the last-resort gallery scan considers (default: 10)
    pub max_fallback_images: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_fallback_images: 10,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductExtractor {
    config: ExtractorConfig,
}

impl ProductExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extract a product from `html`, served from `page_url` after redirects.
    ///
    /// Fails only when no tier yields a title.
    pub fn extract(&self, html: &str, page_url: &Url) -> Result<ExtractedProduct> {
        let document = Html::parse_document(html);
        let meta = MetaTags::collect(&document);

        let mut draft = ProductDraft {
            canonical_url: canonical_url(&document, &meta, page_url),
            ..Default::default()
        };

        structured::apply(&document, &mut draft, page_url);
        meta::apply(&meta, &mut draft, page_url);
        fallback::apply(
            &document,
            &mut draft,
            page_url,
            self.config.max_fallback_images,
        );

        let product = draft
            .finish(page_url)
            .ok_or_else(|| VitrineError::ExtractionFailed(page_url.to_string()))?;

        tracing::debug!(
            "Extracted {:?} from {} (price: {:?}, {} images)",
            product.title,
            page_url,
            product.price_cents,
            product.images.len()
        );

        Ok(product)
    }
}

pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static CSS selector")
}

/// `<link rel="canonical">`, then `og:url`, then the page URL itself.
fn canonical_url(document: &Html, meta: &MetaTags, page_url: &Url) -> Option<String> {
    let link_sel = selector("link[rel][href]");
    let from_link = document
        .select(&link_sel)
        .filter(|el| {
            el.value()
                .attr("rel")
                .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("canonical")))
        })
        .find_map(|el| el.value().attr("href").and_then(|href| resolve_url(href, page_url)));

    from_link.or_else(|| {
        meta.values(&["og:url"])
            .find_map(|href| resolve_url(href, page_url))
    })
}

/// Partially extracted product. Setters only fill empty slots, so the first
/// tier to provide a field wins.
#[derive(Debug, Default)]
pub(crate) struct ProductDraft {
    title: Option<String>,
    description: Option<String>,
    images: Vec<String>,
    price_cents: Option<i64>,
    currency: Option<String>,
    canonical_url: Option<String>,
    attributes: BTreeMap<String, String>,
}

impl ProductDraft {
    pub(crate) fn fill_title(&mut self, raw: Option<&str>) {
        fill_text(&mut self.title, raw);
    }

    pub(crate) fn fill_description(&mut self, raw: Option<&str>) {
        fill_text(&mut self.description, raw);
    }

    pub(crate) fn fill_price(&mut self, cents: Option<i64>) {
        if self.price_cents.is_none() {
            self.price_cents = cents;
        }
    }

    pub(crate) fn fill_currency(&mut self, raw: Option<&str>) {
        if self.currency.is_none() {
            self.currency = raw.and_then(normalize_currency);
        }
    }

    pub(crate) fn fill_attribute(&mut self, key: &str, raw: Option<&str>) {
        if let Some(value) = raw.and_then(clean_text) {
            self.attributes.entry(key.to_string()).or_insert(value);
        }
    }

    /// Append an image, resolved against the page and skipped if already seen.
    pub(crate) fn add_image(&mut self, raw: &str, base: &Url) -> bool {
        match resolve_url(raw, base) {
            Some(url) if !self.images.contains(&url) => {
                self.images.push(url);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn has_title(&self) -> bool {
        self.title.is_some()
    }

    fn finish(self, page_url: &Url) -> Option<ExtractedProduct> {
        let title = self.title?;
        Some(ExtractedProduct {
            title,
            description: self.description,
            image_url: self.images.first().cloned(),
            images: self.images,
            price_cents: self.price_cents,
            currency: self.currency,
            canonical_url: self
                .canonical_url
                .unwrap_or_else(|| page_url.to_string()),
            final_url: page_url.to_string(),
            attributes: self.attributes,
        })
    }
}

fn fill_text(slot: &mut Option<String>, raw: Option<&str>) {
    if slot.is_none() {
        *slot = raw.and_then(clean_text);
    }
}
