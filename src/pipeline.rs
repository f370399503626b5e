//! Fetch-then-extract, shared by every URL-driven operation.

use std::sync::Arc;

use crate::app::Result;
use crate::domain::ExtractedProduct;
use crate::extractor::ProductExtractor;
use crate::fetcher::Fetcher;

#[derive(Clone)]
pub struct Acquirer {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    extractor: ProductExtractor,
}

impl Acquirer {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>, extractor: ProductExtractor) -> Self {
        Self { fetcher, extractor }
    }

    /// Download `url` and turn it into a product snapshot. Errors from either
    /// stage are returned unchanged.
    pub async fn acquire(&self, url: &str) -> Result<ExtractedProduct> {
        let page = self.fetcher.fetch(url).await?;
        self.extractor.extract(&page.body, &page.final_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::VitrineError;
    use crate::fetcher::stub::{product_page, StubFetcher};

    #[tokio::test]
    async fn test_acquire_fetches_and_extracts() {
        let url = "https://www.amazon.com.br/dp/B01";
        let fetcher = StubFetcher::new().with_page(url, &product_page("Chaleira", Some("129,90")));
        let acquirer = Acquirer::new(Arc::new(fetcher), ProductExtractor::default());

        let product = acquirer.acquire(url).await.unwrap();
        assert_eq!(product.title, "Chaleira");
        assert_eq!(product.price_cents, Some(12990));
        assert_eq!(product.final_url, url);
    }

    #[tokio::test]
    async fn test_acquire_propagates_fetch_errors() {
        let acquirer = Acquirer::new(Arc::new(StubFetcher::new()), ProductExtractor::default());
        let err = acquirer.acquire("https://loja.com.br/missing").await.unwrap_err();
        assert!(matches!(err, VitrineError::FetchFailed { status: Some(404), .. }));

        let err = acquirer.acquire("ftp://loja.com.br/file").await.unwrap_err();
        assert!(matches!(err, VitrineError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_acquire_propagates_extraction_errors() {
        let url = "https://loja.com.br/blank";
        let fetcher = StubFetcher::new().with_page(url, "<html><body></body></html>");
        let acquirer = Acquirer::new(Arc::new(fetcher), ProductExtractor::default());

        let err = acquirer.acquire(url).await.unwrap_err();
        assert!(matches!(err, VitrineError::ExtractionFailed(_)));
    }
}
