use chrono::{DateTime, SecondsFormat, Utc};

use crate::catalog::RawRecord;
use crate::util::{sanitize_html, EMPTY_DESCRIPTION};

/// Title used when a record has none.
pub const UNTITLED: &str = "Untitled";

/// Record fields that may hold a cover image URL, most preferred first.
pub const IMAGE_FIELDS: [&str; 3] = ["cover", "thumbnail", "image"];

/// A catalog result in the shape the RSS builder consumes.
///
/// Every field except `image` is always populated; normalization substitutes
/// a fallback rather than leaving anything empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    /// Absolute URL of the item on the catalog site.
    pub link: String,
    /// Plain text, single line.
    pub description: String,
    /// Publication timestamp exactly as the catalog reported it, or a
    /// synthesized ISO-8601 timestamp when it reported none.
    pub pub_date: String,
    /// Absolute URL of the first available cover image.
    pub image: Option<String>,
}

/// Maps a raw record onto a [`FeedItem`], stamping missing publication
/// dates with the current time.
///
/// See [`normalize_at`] for the field rules.
pub fn normalize(record: &RawRecord, origin: &str) -> FeedItem {
    normalize_at(record, origin, Utc::now())
}

/// Maps a raw record onto a [`FeedItem`] using `now` as the fallback
/// publication time.
///
/// Never fails. Field rules:
/// - `title`: record `title`, else [`UNTITLED`]
/// - `link`: record `url` resolved with [`resolve_link`]
/// - `description`: record `description` run through [`sanitize_html`],
///   else [`EMPTY_DESCRIPTION`]
/// - `pub_date`: record `issued` verbatim, else `now` as ISO-8601
/// - `image`: first of [`IMAGE_FIELDS`] that is present
pub fn normalize_at(record: &RawRecord, origin: &str, now: DateTime<Utc>) -> FeedItem {
    let title = record.text("title").unwrap_or(UNTITLED).to_string();

    let link = resolve_link(record.text("url").unwrap_or(""), origin);

    let description = match sanitize_html(record.text("description").unwrap_or("")) {
        text if text.is_empty() => EMPTY_DESCRIPTION.to_string(),
        text => text,
    };

    let pub_date = match record.text("issued") {
        Some(issued) => issued.to_string(),
        None => iso_timestamp(now),
    };

    let image = record.first_text(&IMAGE_FIELDS).map(str::to_string);

    FeedItem {
        title,
        link,
        description,
        pub_date,
        image,
    }
}

/// Turns a catalog URL into an absolute link.
///
/// The catalog returns a mix of absolute URLs and site-relative paths such
/// as `/api/v1/book/123`. Anything starting with `http` is taken verbatim;
/// everything else is appended to `origin` as-is.
///
/// # Examples
///
/// ```
/// use oreilly_feed::feed::resolve_link;
///
/// let origin = "https://learning.oreilly.com";
/// assert_eq!(
///     resolve_link("/api/v1/book/123", origin),
///     "https://learning.oreilly.com/api/v1/book/123"
/// );
/// assert_eq!(resolve_link("https://example.com/x", origin), "https://example.com/x");
/// ```
pub fn resolve_link(url: &str, origin: &str) -> String {
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("{origin}{url}")
    }
}

/// Formats `now` as an ISO-8601 UTC timestamp, e.g. `2024-05-01T12:30:00Z`.
pub fn iso_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}
