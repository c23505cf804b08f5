//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the trade-history endpoint and
//! run full crawls through `HttpFetcher`.

use sina_tick_crawler::config::Config;
use sina_tick_crawler::crawler::{CancelToken, CrawlStatus};
use sina_tick_crawler::state::{NullSink, ProgressEvent, ProgressSink};
use sina_tick_crawler::{CrawlRequest, Crawler, FetchError, RequestError};
use std::sync::Mutex;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
pub fn create_test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.crawler.request_interval = 0;
    config.crawler.retry_delay = 10;
    config.crawler.max_retries = 2;
    config.source.base_url = format!("{}/transHis.php", server.uri());
    config.source.user_agent = "TickCrawlerTest/1.0".to_string();
    config
}

/// Renders a trade table; each entry is (time, price cell, direction)
pub fn trade_table(rows: &[(&str, &str, &str)]) -> String {
    let mut html = String::from(
        "<html><head><title>成交明细</title></head><body>\
         <table class=\"datatbl\"><thead><tr><th>成交时间</th><td>成交价</td>\
         <td>价格变动</td><td>成交量(手)</td><td>成交额(元)</td><th>性质</th></tr></thead><tbody>",
    );
    for (time, price, direction) in rows {
        html.push_str(&format!(
            "<tr><th>{}</th><td>{}</td><td>+0.01</td><td>100</td><td>115,800</td><th><h5>{}</h5></th></tr>",
            time, price, direction
        ));
    }
    html.push_str("</tbody></table></body></html>");
    html
}

/// A page of `count` well-formed rows with distinct times
pub fn full_page(page: u32, count: u32) -> String {
    let rows: Vec<(String, String)> = (0..count)
        .map(|i| {
            (
                format!("14:{:02}:{:02}", 59 - page, 59 - i),
                format!("{}.{}", 10 + page, i),
            )
        })
        .collect();
    let borrowed: Vec<(&str, &str, &str)> = rows
        .iter()
        .map(|(t, p)| (t.as_str(), p.as_str(), "买盘"))
        .collect();
    trade_table(&borrowed)
}

async fn mount_page(server: &MockServer, date: &str, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/transHis.php"))
        .and(query_param("date", date))
        .and(query_param("page", page.to_string().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html"))
        .mount(server)
        .await;
}

/// Every request not matched earlier gets a header-only page
async fn mount_empty_fallback(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/transHis.php"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(trade_table(&[]).into_bytes(), "text/html"),
        )
        .mount(server)
        .await;
}

#[derive(Default)]
struct CollectingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressSink for CollectingSink {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[tokio::test]
async fn test_two_pages_then_empty_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/transHis.php"))
        .and(query_param("symbol", "sz000001"))
        .and(query_param("page", "1"))
        .and(header("user-agent", "TickCrawlerTest/1.0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(full_page(1, 5).into_bytes(), "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "2021-04-27", 2, full_page(2, 5)).await;
    mount_empty_fallback(&server).await;

    let crawler = Crawler::from_config(&create_test_config(&server)).unwrap();
    let request = CrawlRequest::parse("sz000001", "2021-04-27", "2021-04-27").unwrap();
    let sink = CollectingSink::default();

    let report = crawler.run(&request, &sink, &CancelToken::new()).await;

    assert!(report.is_complete());
    assert_eq!(report.records.len(), 10);
    assert_eq!(report.pages_fetched, 3);

    let events = sink.events.lock().unwrap();
    let pages: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Page { page, .. } => Some(*page),
            _ => None,
        })
        .collect();
    assert_eq!(pages, vec![1, 2, 3]);
    assert_eq!(events.len(), 4);
    assert_eq!(events.last().unwrap().to_string(), "Finish");

    // Page 1 rows come first, in page order
    assert_eq!(report.records[0].time, "14:58:59");
    assert_eq!(report.records[4].time, "14:58:55");
    assert_eq!(report.records[5].time, "14:57:59");
    assert_eq!(report.records[0].direction, "买盘");
}

#[tokio::test]
async fn test_gbk_body_decoded_without_declared_charset() {
    let server = MockServer::start().await;

    let html = trade_table(&[("09:25:00", "23.15", "卖盘"), ("09:30:03", "23.16", "中性盘")]);
    let (gbk, _, _) = encoding_rs::GBK.encode(&html);
    // No charset in the Content-Type header
    Mock::given(method("GET"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(gbk.into_owned(), "text/html"))
        .mount(&server)
        .await;
    mount_empty_fallback(&server).await;

    let crawler = Crawler::from_config(&create_test_config(&server)).unwrap();
    let request = CrawlRequest::parse("sz000001", "2021-04-27", "2021-04-27").unwrap();

    let report = crawler.run(&request, &NullSink, &CancelToken::new()).await;

    assert_eq!(report.records.len(), 2);
    assert_eq!(report.records[0].direction, "卖盘");
    assert_eq!(report.records[1].direction, "中性盘");
    assert_eq!(report.records[1].price, 23.16);
}

#[tokio::test]
async fn test_malformed_row_skipped_and_next_page_fetched() {
    let server = MockServer::start().await;

    // A row missing its volume and value cells
    let page_one = trade_table(&[
        ("15:00:00", "11.58", "买盘"),
        ("14:59:57", "--", "卖盘"),
        ("14:59:54", "11.57", "卖盘"),
    ])
    .replace(
        "</tbody>",
        "<tr><th>14:59:52</th><td>11.57</td><td>0.00</td><th>买盘</th></tr></tbody>",
    );
    mount_page(&server, "2021-04-27", 1, page_one).await;
    mount_page(
        &server,
        "2021-04-27",
        2,
        trade_table(&[("14:59:51", "11.57", "中性盘")]),
    )
    .await;
    mount_empty_fallback(&server).await;

    let crawler = Crawler::from_config(&create_test_config(&server)).unwrap();
    let request = CrawlRequest::parse("sz000001", "2021-04-27", "2021-04-27").unwrap();

    let report = crawler.run(&request, &NullSink, &CancelToken::new()).await;

    assert!(report.is_complete());
    assert_eq!(report.rows_skipped, 2);
    let times: Vec<&str> = report.records.iter().map(|r| r.time.as_str()).collect();
    assert_eq!(times, vec!["15:00:00", "14:59:54", "14:59:51"]);
}

#[tokio::test]
async fn test_each_date_requested_in_order() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "2021-04-30",
        1,
        trade_table(&[("10:00:00", "3.0", "买盘")]),
    )
    .await;
    mount_page(
        &server,
        "2021-05-01",
        1,
        trade_table(&[("10:00:00", "4.0", "买盘")]),
    )
    .await;
    mount_empty_fallback(&server).await;

    let crawler = Crawler::from_config(&create_test_config(&server)).unwrap();
    let request = CrawlRequest::parse("sz000001", "2021-04-29", "2021-05-02").unwrap();

    let report = crawler.run(&request, &NullSink, &CancelToken::new()).await;

    let requested: Vec<(String, String)> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| {
            let pairs: std::collections::HashMap<_, _> = r.url.query_pairs().into_owned().collect();
            (pairs["date"].clone(), pairs["page"].clone())
        })
        .collect();
    let expected: Vec<(String, String)> = [
        ("2021-04-29", "1"),
        ("2021-04-30", "1"),
        ("2021-04-30", "2"),
        ("2021-05-01", "1"),
        ("2021-05-01", "2"),
        ("2021-05-02", "1"),
    ]
    .iter()
    .map(|(d, p)| (d.to_string(), p.to_string()))
    .collect();
    assert_eq!(requested, expected);

    let prices: Vec<f64> = report.records.iter().map(|r| r.price).collect();
    assert_eq!(prices, vec![3.0, 4.0]);
}

#[tokio::test]
async fn test_server_error_retried_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "2021-04-27",
        1,
        trade_table(&[("10:00:00", "7.7", "买盘")]),
    )
    .await;
    mount_empty_fallback(&server).await;

    let crawler = Crawler::from_config(&create_test_config(&server)).unwrap();
    let request = CrawlRequest::parse("sz000001", "2021-04-27", "2021-04-27").unwrap();

    let report = crawler.run(&request, &NullSink, &CancelToken::new()).await;

    assert!(report.is_complete());
    assert_eq!(report.records.len(), 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_client_error_aborts_run_keeping_partial_records() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "2021-04-27",
        1,
        trade_table(&[("10:00:00", "7.7", "买盘")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    mount_empty_fallback(&server).await;

    let crawler = Crawler::from_config(&create_test_config(&server)).unwrap();
    let request = CrawlRequest::parse("sz000001", "2021-04-27", "2021-04-29").unwrap();
    let sink = CollectingSink::default();

    let report = crawler.run(&request, &sink, &CancelToken::new()).await;

    match &report.status {
        CrawlStatus::Failed { page, error, .. } => {
            assert_eq!(*page, 2);
            assert!(matches!(error, FetchError::Status { code: 403, .. }));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(report.records.len(), 1);
    // Later dates are never requested
    assert_eq!(server.received_requests().await.unwrap().len(), 2);

    let events = sink.events.lock().unwrap();
    assert!(events.last().unwrap().to_string().starts_with("Error"));
}

#[tokio::test]
async fn test_inverted_range_rejected_without_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = CrawlRequest::parse("sz000001", "2021-04-28", "2021-04-27");

    assert!(matches!(result, Err(RequestError::InvalidRange { .. })));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_spawned_crawl_can_be_cancelled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(full_page(1, 3).into_bytes(), "text/html"),
        )
        .mount(&server)
        .await;
    mount_empty_fallback(&server).await;

    let mut config = create_test_config(&server);
    config.crawler.request_interval = 200;
    let crawler = Crawler::from_config(&config).unwrap();
    let request = CrawlRequest::parse("sz000001", "2021-01-01", "2021-12-31").unwrap();

    let mut handle = crawler.spawn(request);
    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        // Page 2 of the first day waits out the pacing interval; cancel during it
        if matches!(event, ProgressEvent::Page { page: 2, .. }) {
            handle.cancel();
        }
        events.push(event);
    }
    let report = handle.wait().await.unwrap();

    assert!(matches!(report.status, CrawlStatus::Cancelled { page: 2, .. }));
    assert_eq!(report.records.len(), 3);
    assert_eq!(events.last(), Some(&ProgressEvent::Cancelled));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
