use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::Client;
use url::Url;

use crate::app::{Result, VitrineError};
use crate::fetcher::{parse_http_url, FetchedPage, Fetcher, FetcherConfig};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";

pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        let language = HeaderValue::from_str(&config.accept_language)
            .map_err(|e| VitrineError::Config(format!("accept_language: {e}")))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = Client::builder()
            .timeout(config.timeout())
            .redirect(Policy::limited(config.max_redirects))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| VitrineError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    fn too_large(&self, url: &Url) -> VitrineError {
        VitrineError::PayloadTooLarge {
            url: url.to_string(),
            limit: self.max_body_bytes,
        }
    }
}

fn transport_error(url: &Url, err: reqwest::Error) -> VitrineError {
    if err.is_timeout() {
        return VitrineError::Timeout(url.to_string());
    }
    VitrineError::FetchFailed {
        status: err.status().map(|s| s.as_u16()),
        message: format!("{url}: {err}"),
    }
}

/// How far into the document a `<meta charset>` declaration is looked for.
const META_SNIFF_BYTES: usize = 1024;

/// windows-1252 code points for bytes 0x80..=0x9F. Unassigned bytes keep
/// their Latin-1 value.
const WINDOWS_1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{81}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{8D}', '\u{017D}', '\u{8F}',
    '\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{9D}', '\u{017E}', '\u{0178}',
];

/// Decode a body using the charset from the Content-Type header, falling back
/// to a `<meta charset>` near the top of the document. Latin-1 is still common
/// on older Brazilian storefronts; everything else is treated as UTF-8.
fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let charset = content_type
        .and_then(charset_param)
        .or_else(|| meta_charset(bytes));

    match charset.as_deref() {
        // Browsers decode every Latin-1 label as windows-1252.
        Some("iso-8859-1" | "latin1" | "latin-1" | "windows-1252" | "cp1252") => {
            bytes.iter().map(|&b| windows_1252_char(b)).collect()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn windows_1252_char(byte: u8) -> char {
    match byte {
        0x80..=0x9F => WINDOWS_1252_HIGH[usize::from(byte - 0x80)],
        _ => char::from(byte),
    }
}

fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|param| {
        let param = param.trim().to_ascii_lowercase();
        param
            .strip_prefix("charset=")
            .map(|c| c.trim_matches(['"', '\'']).to_string())
            .filter(|c| !c.is_empty())
    })
}

/// `<meta charset="...">` or the `http-equiv` form, within the first KiB.
fn meta_charset(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(META_SNIFF_BYTES)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    head.match_indices("<meta").find_map(|(start, _)| {
        let tag = &head[start..];
        let tag = &tag[..tag.find('>').unwrap_or(tag.len())];
        let value = &tag[tag.find("charset=")? + "charset=".len()..];
        let value = value.trim_start_matches(['"', '\'']);
        let end = value
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(value.len());
        (end > 0).then(|| value[..end].to_string())
    })
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let url = parse_http_url(url)?;

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VitrineError::FetchFailed {
                status: Some(status.as_u16()),
                message: format!("{url} returned {status}"),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        if let Some(len) = response.content_length() {
            if len > self.max_body_bytes as u64 {
                return Err(self.too_large(&url));
            }
        }

        // Content-Length may be missing or wrong, so count what actually arrives.
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| transport_error(&url, e))?
        {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(self.too_large(&url));
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!("Fetched {} ({} bytes, final {})", url, body.len(), final_url);

        Ok(FetchedPage {
            body: decode_body(&body, content_type.as_deref()),
            final_url,
            status: status.as_u16(),
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&FetcherConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_final_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/produto"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    "<html><title>Panela</title></html>",
                    "text/html; charset=utf-8",
                ),
            )
            .mount(&server)
            .await;

        let url = format!("{}/produto", server.uri());
        let page = fetcher().fetch(&url).await.unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.final_url.as_str(), url);
        assert!(page.body.contains("Panela"));
        assert_eq!(
            page.content_type.as_deref(),
            Some("text/html; charset=utf-8")
        );
    }

    #[tokio::test]
    async fn test_fetch_sends_identifying_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        fetcher().fetch(&server.uri()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let headers = &requests[0].headers;
        let header = |name: &str| headers.get(name).unwrap().to_str().unwrap().to_string();
        assert!(header("user-agent").starts_with("vitrine/"));
        assert_eq!(header("accept-language"), "pt-BR,pt;q=0.9,en;q=0.8");
        assert!(header("accept").starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let server = MockServer::start().await;
        let target = format!("{}/final", server.uri());
        Mock::given(method("GET"))
            .and(path("/short"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", target.as_str()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/final"))
            .respond_with(ResponseTemplate::new(200).set_body_string("landed"))
            .mount(&server)
            .await;

        let page = fetcher()
            .fetch(&format!("{}/short", server.uri()))
            .await
            .unwrap();
        assert_eq!(page.final_url.as_str(), target);
        assert_eq!(page.body, "landed");
    }

    #[tokio::test]
    async fn test_non_success_status_is_fetch_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetcher().fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(
            err,
            VitrineError::FetchFailed {
                status: Some(404),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(4096)))
            .mount(&server)
            .await;

        let config = FetcherConfig {
            max_body_bytes: 1024,
            ..Default::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(
            err,
            VitrineError::PayloadTooLarge { limit: 1024, .. }
        ));
    }

    #[tokio::test]
    async fn test_chunked_body_over_limit_is_rejected() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        // No Content-Length, so only the running byte count can catch it.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;

            let mut response =
                b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nTransfer-Encoding: chunked\r\n\r\n"
                    .to_vec();
            for _ in 0..8 {
                response.extend_from_slice(b"200\r\n");
                response.extend_from_slice(&[b'x'; 512]);
                response.extend_from_slice(b"\r\n");
            }
            response.extend_from_slice(b"0\r\n\r\n");
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;
        });

        let config = FetcherConfig {
            max_body_bytes: 1024,
            ..Default::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();
        let err = fetcher.fetch(&format!("http://{addr}/")).await.unwrap_err();
        assert!(matches!(
            err,
            VitrineError::PayloadTooLarge { limit: 1024, .. }
        ));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_millis(2500)),
            )
            .mount(&server)
            .await;

        let config = FetcherConfig {
            timeout_secs: 1,
            ..Default::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, VitrineError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_non_http_scheme_rejected_before_network() {
        let server = MockServer::start().await;
        let err = fetcher().fetch("ftp://example.com/file").await.unwrap_err();
        assert!(matches!(err, VitrineError::InvalidUrl(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn test_decode_latin1_body() {
        let bytes = [b'P', 0xE3, b'o'];
        assert_eq!(
            decode_body(&bytes, Some("text/html; charset=ISO-8859-1")),
            "Pão"
        );
        assert_eq!(decode_body("Pão".as_bytes(), Some("text/html")), "Pão");
        assert_eq!(decode_body("Pão".as_bytes(), None), "Pão");
    }

    #[test]
    fn test_charset_parameter_is_case_insensitive() {
        let bytes = [b'a', 0xE7, 0xE3, b'o'];
        assert_eq!(decode_body(&bytes, Some("text/html; Charset=\"ISO-8859-1\"")), "ação");
        assert_eq!(decode_body(&bytes, Some("text/html;CHARSET=latin1")), "ação");
    }

    #[test]
    fn test_decode_windows_1252_punctuation() {
        let bytes = [0x93, b'R', b'$', b' ', b'5', 0x94, b' ', 0x96, b' ', 0x80, b' ', 0x81];
        assert_eq!(
            decode_body(&bytes, Some("text/html; charset=windows-1252")),
            "\u{201C}R$ 5\u{201D} \u{2013} \u{20AC} \u{81}"
        );
    }

    #[test]
    fn test_meta_charset_used_when_header_has_none() {
        let mut page = b"<html><head><meta charset=\"iso-8859-1\"><title>P".to_vec();
        page.extend_from_slice(&[0xE3, b'o']);
        page.extend_from_slice(b"</title></head></html>");
        assert!(decode_body(&page, Some("text/html")).contains("<title>Pão</title>"));

        let mut page =
            b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=ISO-8859-1\">".to_vec();
        page.push(0xE9);
        assert!(decode_body(&page, None).ends_with('é'));

        // The header wins over the document.
        let page = "<meta charset=\"iso-8859-1\">Pão";
        assert!(decode_body(page.as_bytes(), Some("text/html; charset=utf-8")).ends_with("Pão"));
    }
}
