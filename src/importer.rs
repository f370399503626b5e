//! Sequential bulk import of pasted product links.

use serde::Serialize;

use crate::aggregator::{CreatedGift, OfferAggregator};
use crate::app::{ErrorKind, VitrineError};
use crate::domain::GiftTarget;
use crate::store::Store;

/// Result of importing one URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportOutcome {
    pub url: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gift_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ImportOutcome {
    fn succeeded(url: &str, created: CreatedGift) -> Self {
        Self {
            url: url.to_string(),
            success: true,
            gift_id: Some(created.gift_id),
            offer_id: Some(created.offer_id),
            title: Some(created.title),
            error: None,
            error_kind: None,
        }
    }

    fn failed(url: &str, err: &VitrineError) -> Self {
        Self {
            url: url.to_string(),
            success: false,
            gift_id: None,
            offer_id: None,
            title: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
        }
    }
}

pub struct BulkImporter<S> {
    aggregator: OfferAggregator<S>,
}

impl<S: Store> BulkImporter<S> {
    pub fn new(aggregator: OfferAggregator<S>) -> Self {
        Self { aggregator }
    }

    /// Create one gift per URL, one URL at a time. A failing URL is recorded
    /// and the batch continues. Outcomes are returned in input order.
    pub async fn import_links(&self, target: &GiftTarget, urls: &[String]) -> Vec<ImportOutcome> {
        let mut outcomes = Vec::with_capacity(urls.len());

        for url in urls {
            let outcome = match self.aggregator.create_gift_from_url(target, url).await {
                Ok(created) => ImportOutcome::succeeded(url, created),
                Err(e) => {
                    tracing::warn!("Failed to import {}: {}", url, e);
                    ImportOutcome::failed(url, &e)
                }
            };
            outcomes.push(outcome);
        }

        let imported = outcomes.iter().filter(|o| o.success).count();
        tracing::info!(
            "Imported {}/{} links into registry {}",
            imported,
            outcomes.len(),
            target.registry_id
        );

        outcomes
    }
}

/// Split a pasted block into URLs. Blank entries and `#` comment lines are
/// skipped; order is preserved.
pub fn parse_link_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .flat_map(str::split_whitespace)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::extractor::ProductExtractor;
    use crate::fetcher::stub::{product_page, StubFetcher};
    use crate::pipeline::Acquirer;
    use crate::store::SqliteStore;

    fn importer(fetcher: Arc<StubFetcher>) -> (BulkImporter<SqliteStore>, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let acquirer = Acquirer::new(fetcher, ProductExtractor::default());
        let aggregator = OfferAggregator::new(Arc::clone(&store), acquirer);
        (BulkImporter::new(aggregator), store)
    }

    #[tokio::test]
    async fn test_failure_in_the_middle_does_not_abort_batch() {
        let urls: Vec<String> = vec![
            "https://www.amazon.com.br/dp/A".into(),
            "https://www.americanas.com.br/p/broken".into(),
            "https://www.magazineluiza.com.br/p/C".into(),
        ];
        let fetcher = Arc::new(
            StubFetcher::new()
                .with_page(&urls[0], &product_page("Panela", Some("199.90")))
                .with_page(&urls[1], "<html><body>sem produto</body></html>")
                .with_page(&urls[2], &product_page("Faqueiro", None)),
        );
        let (importer, store) = importer(Arc::clone(&fetcher));

        let outcomes = importer
            .import_links(&GiftTarget::new("wedding-1"), &urls)
            .await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].success);
        assert_eq!(outcomes[0].title.as_deref(), Some("Panela"));
        assert!(!outcomes[1].success);
        assert_eq!(outcomes[1].url, urls[1]);
        assert_eq!(outcomes[1].error_kind, Some(ErrorKind::ExtractionFailed));
        assert!(outcomes[1].gift_id.is_none());
        assert!(outcomes[2].success);

        assert_eq!(fetcher.calls(), urls);

        let gifts = store.read(|r| r.gifts_for_registry("wedding-1")).unwrap();
        let ids: Vec<i64> = gifts.iter().map(|g| g.id).collect();
        assert_eq!(
            ids,
            vec![outcomes[0].gift_id.unwrap(), outcomes[2].gift_id.unwrap()]
        );
        assert_eq!(gifts[0].price_cents, Some(19990));
        assert_eq!(gifts[1].price_cents, None);
    }

    #[tokio::test]
    async fn test_invalid_url_is_reported_without_fetching() {
        let fetcher = Arc::new(StubFetcher::new());
        let (importer, _store) = importer(Arc::clone(&fetcher));

        let outcomes = importer
            .import_links(&GiftTarget::new("wedding-1"), &["ftp://example.com/file".to_string()])
            .await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].error_kind, Some(ErrorKind::InvalidUrl));
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let (importer, _store) = importer(Arc::new(StubFetcher::new()));
        let outcomes = importer.import_links(&GiftTarget::new("wedding-1"), &[]).await;
        assert!(outcomes.is_empty());
    }

    #[test]
    fn test_outcome_serialization_omits_empty_fields() {
        let outcome = ImportOutcome::failed(
            "https://loja.com.br/x",
            &VitrineError::FetchFailed {
                status: Some(503),
                message: "unavailable".into(),
            },
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error_kind"], "fetch_failed");
        assert!(json.get("gift_id").is_none());
    }

    #[test]
    fn test_parse_link_list() {
        let text = "
            # lista de casamento
            https://a.com.br/1   https://b.com.br/2

            https://c.com.br/3
            #https://skipped.com.br
        ";
        assert_eq!(
            parse_link_list(text),
            vec!["https://a.com.br/1", "https://b.com.br/2", "https://c.com.br/3"]
        );
        assert!(parse_link_list("  \n\n ").is_empty());
    }
}
