//! End-to-end tests: crawl a mock source, then export and summarise

use crate::crawl_tests::{create_test_config, full_page, trade_table};
use sina_tick_crawler::crawler::CancelToken;
use sina_tick_crawler::output::{export_to_directory, OutputError, PriceSummary, CSV_HEADER};
use sina_tick_crawler::state::{NullSink, RecordStore};
use sina_tick_crawler::{CrawlRequest, Crawler};
use tempfile::TempDir;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Reads an exported file back, checking and stripping its BOM
fn read_back(path: &std::path::Path) -> (Vec<String>, Vec<Vec<String>>) {
    let bytes = std::fs::read(path).expect("Failed to read export");
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"), "export lacks UTF-8 BOM");

    let mut reader = csv::Reader::from_reader(&bytes[3..]);
    let headers = reader
        .headers()
        .expect("Failed to read header")
        .iter()
        .map(String::from)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.expect("Bad CSV row").iter().map(String::from).collect())
        .collect();
    (headers, rows)
}

#[tokio::test]
async fn test_crawl_then_export_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(full_page(1, 4).into_bytes(), "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(trade_table(&[]).into_bytes(), "text/html"),
        )
        .mount(&server)
        .await;

    let crawler = Crawler::from_config(&create_test_config(&server)).unwrap();
    let request = CrawlRequest::parse("sz000001", "2021-04-27", "2021-04-28").unwrap();
    let report = crawler.run(&request, &NullSink, &CancelToken::new()).await;
    assert_eq!(report.records.len(), 8);

    let dir = TempDir::new().unwrap();
    let path = export_to_directory(&report.records, &request, dir.path()).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "sz000001-2021-04-27-2021-04-28.csv"
    );

    let (headers, rows) = read_back(&path);
    assert_eq!(headers, CSV_HEADER.to_vec());
    assert_eq!(rows.len(), report.records.len());
    for (row, record) in rows.iter().zip(report.records.iter()) {
        assert_eq!(row.len(), 6);
        assert_eq!(row[0], record.time);
        assert_eq!(row[1].parse::<f64>().unwrap(), record.price);
        assert_eq!(row[2], record.change);
        assert_eq!(row[3], record.volume);
        assert_eq!(row[4], record.value);
        assert_eq!(row[5], record.direction);
    }

    let summary = PriceSummary::from_records(&report.records).unwrap();
    assert_eq!(summary.count, 8);
    assert_eq!(summary.max, 11.3);
    assert_eq!(summary.min, 11.0);
}

#[test]
fn test_export_before_crawl_is_rejected() {
    let dir = TempDir::new().unwrap();
    let request = CrawlRequest::parse("sz000001", "2021-04-27", "2021-04-27").unwrap();

    let result = export_to_directory(&RecordStore::new(), &request, dir.path());

    assert!(matches!(result, Err(OutputError::NoRecords)));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
