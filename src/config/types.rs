use serde::Deserialize;

/// Trade-history endpoint the crawler paginates through
pub const DEFAULT_BASE_URL: &str = "http://market.finance.sina.com.cn/transHis.php";

/// Desktop browser identity sent on every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/94.0.4606.81 Safari/537.36";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub source: SourceConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Minimum time between two consecutive requests (milliseconds)
    #[serde(rename = "request-interval")]
    pub request_interval: u64,

    /// Upper bound on pages fetched for a single date
    #[serde(rename = "max-pages-per-date")]
    pub max_pages_per_date: u32,

    /// Extra attempts for a transient transport failure
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base delay between retry attempts (milliseconds), multiplied by the attempt number
    #[serde(rename = "retry-delay")]
    pub retry_delay: u64,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// TCP connect timeout (seconds)
    #[serde(rename = "connect-timeout")]
    pub connect_timeout: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_interval: 1000,
            max_pages_per_date: 1000,
            max_retries: 3,
            retry_delay: 5000,
            request_timeout: 30,
            connect_timeout: 10,
        }
    }
}

/// Upstream data source configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Endpoint queried with `symbol`, `date` and `page` parameters
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// User-Agent header value
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory exported CSV files are written to
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
        }
    }
}
