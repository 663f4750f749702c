use crate::error::{Result, StoreError};
use url::Url;

/// Longest URL the store accepts, in bytes.
pub const MAX_URL_LENGTH: usize = 2048;

/// Checks that `url` can be stored.
///
/// Accepts an absolute URI (`https://example.com/a`, `mailto:x@y`) or an
/// absolute path (`/a/b?c`), no longer than [`MAX_URL_LENGTH`] bytes.
pub fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(StoreError::InvalidUrl("URL cannot be empty".to_string()));
    }

    if url.len() > MAX_URL_LENGTH {
        return Err(StoreError::InvalidUrl(format!(
            "URL cannot be longer than {} bytes, got {}",
            MAX_URL_LENGTH,
            url.len()
        )));
    }

    // `Url::parse` trims and drops these silently, but the raw string is what gets stored.
    if url.bytes().any(|b| b.is_ascii_control() || b == b' ') {
        return Err(StoreError::InvalidUrl(format!(
            "URL cannot contain whitespace or control characters: {url:?}"
        )));
    }

    let parsed = if url.starts_with('/') {
        Url::parse(&format!("http://localhost{url}"))
    } else {
        Url::parse(url)
    };

    parsed
        .map(|_| ())
        .map_err(|e| StoreError::InvalidUrl(format!("{e}: {url}")))
}

/// Checks that `owner` identifies someone.
pub fn validate_owner(owner: &str) -> Result<()> {
    if owner.is_empty() {
        return Err(StoreError::InvalidOwner(
            "owner cannot be empty".to_string(),
        ));
    }
    Ok(())
}
