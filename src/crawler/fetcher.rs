//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Building the per-page query URL
//! - GET requests returning raw bytes plus the declared charset
//! - Error classification into retryable and fatal failures

use crate::config::{CrawlerConfig, SourceConfig};
use crate::crawler::encoding::{charset_from_content_type, decode_body, detect_encoding};
use crate::FetchError;
use async_trait::async_trait;
use chrono::NaiveDate;
use encoding_rs::Encoding;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Raw response of one page request
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Undecoded response body
    pub body: Vec<u8>,

    /// Charset named by the `Content-Type` header, if any
    pub declared_encoding: Option<String>,
}

impl FetchedPage {
    /// Encoding sniffed from the body itself
    pub fn detected_encoding(&self) -> &'static Encoding {
        detect_encoding(&self.body, self.declared_encoding.as_deref())
    }

    /// Decodes the body with the detected encoding
    pub fn text(&self) -> String {
        decode_body(&self.body, self.declared_encoding.as_deref())
    }
}

/// Capability to GET one page
///
/// The crawler only depends on this trait, so tests and alternative
/// transports can stand in for `HttpFetcher`.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use sina_tick_crawler::config::{CrawlerConfig, SourceConfig};
/// use sina_tick_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default(), &SourceConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    source: &SourceConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(source.user_agent.clone())
        .timeout(Duration::from_secs(crawler.request_timeout))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Builds the query URL for one (ticker, date, page) triple
///
/// ```
/// use chrono::NaiveDate;
/// use sina_tick_crawler::crawler::build_page_url;
/// use url::Url;
///
/// let base = Url::parse("http://market.finance.sina.com.cn/transHis.php").unwrap();
/// let date = NaiveDate::from_ymd_opt(2021, 4, 27).unwrap();
/// let url = build_page_url(&base, "sz000001", date, 2);
/// assert_eq!(
///     url.as_str(),
///     "http://market.finance.sina.com.cn/transHis.php?symbol=sz000001&date=2021-04-27&page=2"
/// );
/// ```
pub fn build_page_url(base: &Url, ticker: &str, date: NaiveDate, page: u32) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("symbol", ticker)
        .append_pair("date", &date.format("%Y-%m-%d").to_string())
        .append_pair("page", &page.to_string());
    url
}

/// `PageFetcher` backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Wraps an already configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from crawler and source settings
    pub fn from_config(
        crawler: &CrawlerConfig,
        source: &SourceConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(crawler, source)?))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                code: status.as_u16(),
            });
        }

        let declared_encoding = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type);

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        Ok(FetchedPage {
            body: body.to_vec(),
            declared_encoding,
        })
    }
}

/// Maps a reqwest send error onto the crawler's fetch taxonomy
fn classify_error(url: &Url, e: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if e.is_timeout() {
        FetchError::Timeout { url }
    } else if e.is_connect() {
        FetchError::Connect {
            url,
            message: e.to_string(),
        }
    } else {
        FetchError::Other {
            url,
            message: e.to_string(),
        }
    }
}
