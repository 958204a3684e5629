use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur while validating the catalog API base URL.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// Plain HTTP to a non-loopback host would send the bearer token in clear text.
    #[error("Insecure base URL: HTTPS required except for localhost ({0})")]
    InsecureBaseUrl(String),
    /// The URL cannot serve as a base (e.g. `mailto:` style URLs).
    #[error("URL cannot be used as a base: {0}")]
    NotABase(String),
}

/// Validates the base URL the search request is sent to.
///
/// The request carries the API token as a bearer header, so the base must
/// use HTTPS. Plain HTTP is accepted only for loopback hosts, which is what
/// local mock servers bind to.
///
/// # Errors
///
/// Returns [`UrlValidationError`] if:
/// - The URL cannot be parsed ([`UrlValidationError::InvalidUrl`])
/// - The scheme is not `http` or `https` ([`UrlValidationError::UnsupportedScheme`])
/// - The scheme is `http` and the host is not loopback ([`UrlValidationError::InsecureBaseUrl`])
/// - The URL has no hierarchical path ([`UrlValidationError::NotABase`])
///
/// # Examples
///
/// ```
/// use oreilly_feed::util::validate_api_base;
///
/// assert!(validate_api_base("https://learning.oreilly.com").is_ok());
/// assert!(validate_api_base("http://127.0.0.1:8080").is_ok());
/// assert!(validate_api_base("http://learning.oreilly.com").is_err());
/// assert!(validate_api_base("ftp://example.com").is_err());
/// ```
pub fn validate_api_base(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    if url.cannot_be_a_base() {
        return Err(UrlValidationError::NotABase(url_str.to_owned()));
    }

    match url.scheme() {
        "https" => {}
        "http" => {
            if !is_loopback_host(&url) {
                return Err(UrlValidationError::InsecureBaseUrl(url_str.to_owned()));
            }
            tracing::warn!(base_url = %url, "Using non-HTTPS API base URL (localhost only)");
        }
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    Ok(url)
}

fn is_loopback_host(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    if host == "localhost" {
        return true;
    }

    // Strip brackets from IPv6 addresses for parsing
    let host_for_parse = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    host_for_parse
        .parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}
