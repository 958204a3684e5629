//! Feed generation: from raw catalog records to an RSS 2.0 file.
//!
//! - [`normalize`] - maps each raw record onto a [`FeedItem`] with defined fallbacks
//! - [`rss`] - serializes channel metadata and items with `quick-xml`
//! - [`writer`] - persists the document to a file or stdout
//!
//! # Example
//!
//! ```ignore
//! use crate::feed::{build_rss, normalize, write_feed};
//!
//! let items: Vec<_> = records.iter().map(|r| normalize(r, origin)).collect();
//! let xml = build_rss(&channel, &items, Utc::now())?;
//! write_feed(&xml, &target)?;
//! ```

mod normalize;
mod rss;
mod writer;

pub use normalize::{
    iso_timestamp, normalize, normalize_at, resolve_link, FeedItem, IMAGE_FIELDS, UNTITLED,
};
pub use rss::{build_rss, rfc822_timestamp, Channel, ENCLOSURE_TYPE};
pub use writer::{write_feed, WriteError};
