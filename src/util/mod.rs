//! Utility functions shared across the pipeline.
//!
//! This module provides reusable utilities for:
//!
//! - **Text processing**: HTML-to-plain-text sanitization and XML character filtering
//! - **Fallback chains**: first non-empty value from an ordered preference list
//! - **URL validation**: guarding the API base URL the bearer token is sent to
//!
//! # Examples
//!
//! ```
//! use oreilly_feed::util::{first_non_empty, sanitize_html, validate_api_base};
//!
//! assert_eq!(sanitize_html("<p>Hello</p>"), "Hello");
//! assert_eq!(first_non_empty([None, Some("b")]), Some("b"));
//! assert!(validate_api_base("https://learning.oreilly.com").is_ok());
//! ```

mod fallback;
mod text;
mod url_validator;

pub use fallback::first_non_empty;
pub use text::{collapse_whitespace, sanitize_html, strip_xml_invalid_chars, EMPTY_DESCRIPTION};
pub use url_validator::{validate_api_base, UrlValidationError};
