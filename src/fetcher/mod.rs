mod config;
pub mod http_fetcher;
#[cfg(test)]
pub(crate) mod stub;

use async_trait::async_trait;
use url::Url;

use crate::app::{Result, VitrineError};

pub use config::FetcherConfig;
pub use http_fetcher::HttpFetcher;

/// A successfully downloaded document.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Where the document was actually served from, after redirects
    pub final_url: Url,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// Parse user input as an absolute http(s) URL. Nothing else is ever fetched.
pub fn parse_http_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|e| VitrineError::InvalidUrl(format!("{trimmed}: {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(VitrineError::InvalidUrl(format!(
                "{trimmed}: unsupported scheme {other}"
            )))
        }
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(VitrineError::InvalidUrl(format!("{trimmed}: missing host"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(parse_http_url("https://www.amazon.com.br/dp/B0").is_ok());
        assert!(parse_http_url("  http://loja.com.br/p?id=1  ").is_ok());
    }

    #[test]
    fn test_rejects_other_schemes() {
        for raw in ["ftp://example.com/file", "file:///etc/passwd", "javascript:alert(1)"] {
            let err = parse_http_url(raw).unwrap_err();
            assert!(matches!(err, VitrineError::InvalidUrl(_)), "{raw}");
        }
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            parse_http_url("not a url"),
            Err(VitrineError::InvalidUrl(_))
        ));
        assert!(matches!(parse_http_url(""), Err(VitrineError::InvalidUrl(_))));
    }
}
