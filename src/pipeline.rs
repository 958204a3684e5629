//! One run of the generator: fetch → normalize → build → write.
use chrono::Utc;
use reqwest::redirect::Policy;
use thiserror::Error;

use crate::catalog::{fetch_results, FetchError};
use crate::config::{OutputTarget, QueryConfig};
use crate::feed::{build_rss, normalize, write_feed, FeedItem, WriteError};

/// Fatal outcomes of a run. Nothing is written when fetching fails.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub item_count: usize,
    pub target: OutputTarget,
}

/// Builds the HTTP client used for the search request.
///
/// No client-level timeout is set; [`fetch_results`] bounds the request and
/// body read with `QueryConfig::timeout`.
pub fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(concat!("oreilly-feed/", env!("CARGO_PKG_VERSION")))
        .redirect(create_redirect_policy())
        .build()
}

fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        // Limit to 3 redirects
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        for prev in attempt.previous() {
            if prev.as_str() == url.as_str() {
                return attempt.error("Redirect loop detected");
            }
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

/// Generates the feed described by `config`.
///
/// Stages run strictly in sequence and each consumes only the previous
/// stage's output. A fetch failure returns before anything touches the
/// output target; a write failure leaves any previous file in place.
pub async fn run(client: &reqwest::Client, config: &QueryConfig) -> Result<RunSummary, RunError> {
    let records = fetch_results(client, config).await?;

    let items: Vec<FeedItem> = records
        .iter()
        .map(|record| normalize(record, &config.link_origin))
        .collect();

    let without_image = items.iter().filter(|item| item.image.is_none()).count();
    tracing::debug!(
        items = items.len(),
        without_image = without_image,
        "Normalized search results"
    );

    let document = build_rss(&config.channel, &items, Utc::now())?;
    write_feed(&document, &config.output)?;

    tracing::info!(items = items.len(), output = %config.output, "RSS feed generated");

    Ok(RunSummary {
        item_count: items.len(),
        target: config.output.clone(),
    })
}
