use crate::article::ArticleRecord;
use crate::feed::parser::{parse_feed, EntryFilter, ParseResult};
use crate::feed::FeedConfig;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching or parsing one feed.
///
/// None of these abort a run: the failing feed is logged and skipped.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Feed body could not be parsed as RSS, Atom or JSON Feed
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// A feed that could not be collected this run.
#[derive(Debug)]
pub struct FeedFailure {
    pub url: String,
    pub source: String,
    pub error: FetchError,
}

/// Everything the Feed Reader produced in one run.
#[derive(Debug, Default)]
pub struct CollectReport {
    /// Records from every feed that succeeded, in feed order.
    pub records: Vec<ArticleRecord>,
    pub failures: Vec<FeedFailure>,
}

/// Fetches every configured feed in order and flattens their entries.
///
/// A failing feed is logged and recorded in [`CollectReport::failures`];
/// the remaining feeds are still collected.
pub async fn collect_all(
    client: &reqwest::Client,
    feeds: &[FeedConfig],
    filter: EntryFilter,
    timeout: Duration,
) -> CollectReport {
    tracing::info!(cutoff = %filter.cutoff, feeds = feeds.len(), "Collecting items");
    let mut report = CollectReport::default();

    for feed in feeds {
        match collect_one(client, feed, filter, timeout).await {
            Ok(result) => {
                tracing::info!(
                    source = %feed.source,
                    collected = result.records.len(),
                    stale = result.stale,
                    skipped = result.skipped,
                    "Fetched feed"
                );
                report.records.extend(result.records);
            }
            Err(error) => {
                tracing::warn!(
                    feed = %feed.url,
                    source = %feed.source,
                    error = %error,
                    "Feed error, skipping"
                );
                report.failures.push(FeedFailure {
                    url: feed.url.clone(),
                    source: feed.source.clone(),
                    error,
                });
            }
        }
    }

    tracing::info!(
        total = report.records.len(),
        failed = report.failures.len(),
        "Collected items from all feeds"
    );
    report
}

/// Fetches and parses a single feed.
pub async fn collect_one(
    client: &reqwest::Client,
    feed: &FeedConfig,
    filter: EntryFilter,
    timeout: Duration,
) -> Result<ParseResult, FetchError> {
    let bytes = fetch_bytes(client, &feed.url, timeout).await?;
    parse_feed(&bytes, feed, filter).map_err(|e| FetchError::Parse(e.to_string()))
}

async fn fetch_bytes(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<u8>, FetchError> {
    let response = tokio::time::timeout(timeout, client.get(url).send())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    tokio::time::timeout(timeout, read_limited_bytes(response, MAX_FEED_SIZE))
        .await
        .map_err(|_| FetchError::Timeout)?
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title>
    <item><title>Test</title><link>https://example.com/a</link><pubDate>Wed, 03 Jan 2024 10:00:00 GMT</pubDate></item>
</channel></rss>"#;

    fn filter() -> EntryFilter {
        EntryFilter {
            cutoff: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            max_items: 0,
        }
    }

    fn feed(url: String, source: &str) -> FeedConfig {
        FeedConfig {
            url,
            category: "Company News".into(),
            source: source.into(),
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_collect_one_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .insert_header("Content-Type", "application/xml"),
            )
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let f = feed(format!("{}/feed", mock_server.uri()), "A");
        let result = collect_one(&client, &f, filter(), TIMEOUT).await.unwrap();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].source, "A");
    }

    #[tokio::test]
    async fn test_collect_one_404_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let f = feed(format!("{}/feed", mock_server.uri()), "A");
        match collect_one(&client, &f, filter(), TIMEOUT).await {
            Err(FetchError::HttpStatus(404)) => {}
            other => panic!("Expected HttpStatus(404), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let f = feed(format!("{}/feed", mock_server.uri()), "A");
        let result = collect_one(&client, &f, filter(), TIMEOUT).await;
        assert!(matches!(result, Err(FetchError::HttpStatus(500))));
    }

    #[tokio::test]
    async fn test_malformed_feed_parse_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<not valid xml"))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let f = feed(format!("{}/feed", mock_server.uri()), "A");
        match collect_one(&client, &f, filter(), TIMEOUT).await {
            Err(FetchError::Parse(_)) => {}
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_feed_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let f = feed(format!("{}/feed", mock_server.uri()), "A");
        let result = collect_one(&client, &f, filter(), Duration::from_millis(200)).await;
        assert!(matches!(result, Err(FetchError::Timeout)));
    }

    #[tokio::test]
    async fn test_collect_all_skips_broken_feed() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(200).set_body_string("garbage"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/good"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let feeds = vec![
            feed(format!("{}/broken", mock_server.uri()), "Broken"),
            feed(format!("{}/good", mock_server.uri()), "Good"),
        ];
        let report = collect_all(&client, &feeds, filter(), TIMEOUT).await;
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].source, "Good");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source, "Broken");
    }
}
