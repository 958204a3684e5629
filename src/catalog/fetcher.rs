use crate::catalog::record::RawRecord;
use crate::config::QueryConfig;
use futures::StreamExt;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB
const SEARCH_PATH: &str = "api/v2/search/";

/// Errors that can occur while querying the catalog search API.
///
/// Every variant is fatal for the run: there is no retry and no partial
/// result.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request and body read together exceeded the configured timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    /// Response body was not the expected JSON shape
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Search URL could not be built from the configured base
    #[error("Invalid search URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Option<Vec<Value>>,
}

/// Runs the configured search and returns the raw result records.
///
/// Issues exactly one GET to `{api_base}/api/v2/search/` with the `query`,
/// `limit`, and `type` parameters and the token as a bearer
/// `Authorization` header.
///
/// # Returns
///
/// The entries of the response's `results` array in the order the API
/// returned them. A missing, `null`, or empty `results` key yields an empty
/// `Vec`. Entries that are not JSON objects are skipped with a warning.
///
/// # Errors
///
/// - [`FetchError::Network`] - Connection or TLS errors
/// - [`FetchError::Timeout`] - Request plus body read exceeded `config.timeout`
/// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
/// - [`FetchError::ResponseTooLarge`] - Response exceeded 10MB
/// - [`FetchError::Parse`] - Body is not a JSON object of the expected shape
pub async fn fetch_results(
    client: &reqwest::Client,
    config: &QueryConfig,
) -> Result<Vec<RawRecord>, FetchError> {
    let url = search_url(config)?;

    tracing::info!(
        query = %config.query,
        limit = config.limit.get(),
        content_type = %config.content_type,
        "Querying catalog search API"
    );

    let request = async {
        let response = client
            .get(url)
            .bearer_auth(config.token.expose_secret())
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
            {
                tracing::error!(status = %status, "Catalog rejected the API token");
            }
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        read_limited_bytes(response, MAX_RESPONSE_SIZE).await
    };

    let bytes = tokio::time::timeout(config.timeout, request)
        .await
        .map_err(|_| FetchError::Timeout(config.timeout.as_secs()))??;

    let records = parse_results(&bytes)?;
    tracing::info!(count = records.len(), "Received search results");
    Ok(records)
}

/// Builds the search URL with its query parameters.
///
/// The base may carry a path prefix (e.g. a proxy mount point); the search
/// path is appended beneath it rather than replacing its last segment.
fn search_url(config: &QueryConfig) -> Result<Url, FetchError> {
    let mut base = config.api_base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    let mut url = base.join(SEARCH_PATH)?;
    url.query_pairs_mut()
        .append_pair("query", &config.query)
        .append_pair("limit", &config.limit.to_string())
        .append_pair("type", &config.content_type);
    Ok(url)
}

fn parse_results(bytes: &[u8]) -> Result<Vec<RawRecord>, FetchError> {
    let response: SearchResponse = serde_json::from_slice(bytes)?;
    let entries = response.results.unwrap_or_default();
    let total = entries.len();

    let records: Vec<RawRecord> = entries
        .into_iter()
        .filter_map(RawRecord::from_value)
        .collect();

    let skipped = total - records.len();
    if skipped > 0 {
        tracing::warn!(skipped = skipped, "Non-object search results skipped");
    }

    Ok(records)
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
    use crate::config::{Config, Overrides};
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query_config(base: &str) -> QueryConfig {
        Config {
            api_base_url: base.to_string(),
            query: "software development".to_string(),
            limit: 5,
            ..Config::default()
        }
        .resolve(Overrides {
            api_token: Some("test-token".to_string()),
            ..Overrides::default()
        })
        .unwrap()
    }

    #[test]
    fn test_search_url_parameters() {
        let config = query_config("https://learning.oreilly.com");
        let url = search_url(&config).unwrap();
        assert_eq!(url.path(), "/api/v2/search/");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("query".to_string(), "software development".to_string()),
                ("limit".to_string(), "5".to_string()),
                ("type".to_string(), "video".to_string()),
            ]
        );
    }

    #[test]
    fn test_search_url_keeps_base_prefix() {
        let config = query_config("https://proxy.example.com/oreilly");
        let url = search_url(&config).unwrap();
        assert_eq!(url.path(), "/oreilly/api/v2/search/");
    }

    #[test]
    fn test_parse_results_shapes() {
        assert!(parse_results(br#"{"results":[]}"#).unwrap().is_empty());
        assert!(parse_results(br#"{}"#).unwrap().is_empty());
        assert!(parse_results(br#"{"results":null}"#).unwrap().is_empty());

        let records = parse_results(br#"{"results":[{"title":"A"},"junk",7,{"title":"B"}]}"#)
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text("title"), Some("A"));
        assert_eq!(records[1].text("title"), Some("B"));
    }

    #[test]
    fn test_parse_results_rejects_invalid_json() {
        assert!(matches!(
            parse_results(b"<html>not json</html>").unwrap_err(),
            FetchError::Parse(_)
        ));
        assert!(matches!(
            parse_results(b"42").unwrap_err(),
            FetchError::Parse(_)
        ));
    }

    #[tokio::test]
    async fn test_fetch_sends_query_and_bearer_token() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/search/"))
            .and(query_param("query", "software development"))
            .and(query_param("limit", "5"))
            .and(query_param("type", "video"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"results":[{"title":"Intro","url":"/api/v1/book/1"}]}"#)
                    .insert_header("Content-Type", "application/json"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = query_config(&mock_server.uri());
        let client = reqwest::Client::new();

        let records = fetch_results(&client, &config).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text("title"), Some("Intro"));
        assert_eq!(records[0].text("url"), Some("/api/v1/book/1"));
    }

    #[tokio::test]
    async fn test_fetch_401_is_fatal() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1) // No retry
            .mount(&mock_server)
            .await;

        let config = query_config(&mock_server.uri());
        let client = reqwest::Client::new();

        match fetch_results(&client, &config).await.unwrap_err() {
            FetchError::HttpStatus(401) => {}
            e => panic!("Expected HttpStatus(401), got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_fetch_500_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = query_config(&mock_server.uri());
        let client = reqwest::Client::new();

        match fetch_results(&client, &config).await.unwrap_err() {
            FetchError::HttpStatus(503) => {}
            e => panic!("Expected HttpStatus(503), got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_fetch_malformed_body_parse_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&mock_server)
            .await;

        let config = query_config(&mock_server.uri());
        let client = reqwest::Client::new();

        match fetch_results(&client, &config).await.unwrap_err() {
            FetchError::Parse(_) => {}
            e => panic!("Expected Parse error, got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_fetch_missing_results_is_empty() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"count":0}"#))
            .mount(&mock_server)
            .await;

        let config = query_config(&mock_server.uri());
        let client = reqwest::Client::new();

        let records = fetch_results(&client, &config).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"results":[]}"#)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let mut config = query_config(&mock_server.uri());
        config.timeout = Duration::from_secs(1);
        let client = reqwest::Client::new();

        match fetch_results(&client, &config).await.unwrap_err() {
            FetchError::Timeout(1) => {}
            e => panic!("Expected Timeout, got {:?}", e),
        }
    }
}
