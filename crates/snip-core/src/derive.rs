use crate::shortcode::ShortCode;
use sha2::{Digest, Sha256};

/// Number of trailing digest bytes kept for a code.
///
/// Five bytes encode to at most seven base58 characters.
pub const CODE_DIGEST_BYTES: usize = 5;

/// Trait for deriving short codes from URLs.
///
/// Implementations are pure: they don't interact with storage, and the same
/// input must always produce the same code. Uniqueness is not guaranteed;
/// the store detects collisions and reports them as conflicts.
pub trait Deriver: Send + Sync + 'static {
    /// Derives the short code for the given URL.
    fn derive(&self, url: &str) -> ShortCode;
}

/// Derives codes from the tail of a SHA-256 digest of the URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestDeriver;

impl DigestDeriver {
    pub fn new() -> Self {
        Self
    }
}

impl Deriver for DigestDeriver {
    fn derive(&self, url: &str) -> ShortCode {
        let digest = Sha256::digest(url.as_bytes());
        ShortCode::encode(&digest[digest.len() - CODE_DIGEST_BYTES..])
    }
}
