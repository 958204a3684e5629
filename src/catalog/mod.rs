//! Client side of the O'Reilly catalog search API.
//!
//! - [`fetcher`] - the single authenticated search request and response decoding
//! - [`record`] - the untyped result record handed to the normalizer

mod fetcher;
mod record;

pub use fetcher::{fetch_results, FetchError};
pub use record::RawRecord;
