//! In-memory fetcher serving canned pages to service tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::app::{Result, VitrineError};
use crate::fetcher::{parse_http_url, FetchedPage, Fetcher};

#[derive(Default)]
pub(crate) struct StubFetcher {
    pages: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page(self, url: &str, html: &str) -> Self {
        self.set_page(url, html);
        self
    }

    pub(crate) fn set_page(&self, url: &str, html: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), html.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let parsed = parse_http_url(url)?;
        self.calls.lock().unwrap().push(url.to_string());

        let body = self.pages.lock().unwrap().get(url).cloned();
        match body {
            Some(body) => Ok(FetchedPage {
                final_url: parsed,
                status: 200,
                content_type: Some("text/html".to_string()),
                body,
            }),
            None => Err(VitrineError::FetchFailed {
                status: Some(404),
                message: format!("{url} returned 404 Not Found"),
            }),
        }
    }
}

/// A minimal product page with JSON-LD pricing.
pub(crate) fn product_page(name: &str, price: Option<&str>) -> String {
    let offers = match price {
        Some(price) => format!(r#","offers":{{"@type":"Offer","price":"{price}","priceCurrency":"BRL"}}"#),
        None => String::new(),
    };
    format!(
        r#"<html><head><script type="application/ld+json">{{"@context":"https://schema.org","@type":"Product","name":"{name}"{offers}}}</script></head><body></body></html>"#
    )
}
