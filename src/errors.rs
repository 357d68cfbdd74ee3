//! Credential failure reasons.
//!
//! None of these are returned as `Err` from the cache operations; they travel
//! inside [`CredentialStatus`](crate::cache::credential::CredentialStatus) so a
//! refresh loop keeps running while still being able to tell why a token is
//! missing.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// Cache directory cannot be created or used.
    #[error("cache directory unusable: {0}")]
    Configuration(String),

    /// Group or entry name is unusable as a file name.
    #[error("invalid cache key: {0}")]
    InvalidCacheKey(String),

    /// External command failed, is absent, timed out or printed no token.
    #[error("token minting failed: {0}")]
    MintingFailure(String),

    /// Temp-file write, rename or chmod failed.
    #[error("token file I/O failed: {0}")]
    Io(String),

    /// Existing token file could not be read.
    #[error("cached token unreadable: {0}")]
    StaleRead(String),
}

impl CredentialError {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            CredentialError::Configuration(_) => "configuration",
            CredentialError::InvalidCacheKey(_) => "invalid_cache_key",
            CredentialError::MintingFailure(_) => "minting",
            CredentialError::Io(_) => "io",
            CredentialError::StaleRead(_) => "stale_read",
        }
    }
}
