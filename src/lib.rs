//! Turns an O'Reilly Online Learning catalog search into an RSS 2.0 feed.
//!
//! A run is a single linear pass:
//!
//! 1. [`catalog`] issues one authenticated search request
//! 2. [`feed`] normalizes each result and serializes the RSS document
//! 3. [`feed::write_feed`] replaces the output file
//!
//! [`pipeline::run`] drives the whole pass from an immutable
//! [`config::QueryConfig`].

pub mod catalog;
pub mod config;
pub mod feed;
pub mod pipeline;
pub mod util;
