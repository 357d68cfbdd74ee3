use crate::cache::token::TOKEN_VALUE_STUB;
use crate::errors::CredentialError;

/// How a credential was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialStatus {
    /// freshly minted, full lifetime
    Minted,
    /// served from the cache file
    Cached,
    /// renewal failed, previous token still within its lifetime
    Stale(CredentialError),
    /// no usable token, `token` is empty
    Failed(CredentialError),
}

impl CredentialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialStatus::Minted => "minted",
            CredentialStatus::Cached => "cached",
            CredentialStatus::Stale(_) => "stale",
            CredentialStatus::Failed(_) => "failed",
        }
    }
}

/// Result of one credential lookup.
///
/// `into_pair` keeps the `(token, lifetime)` shape older callers expect: a
/// failed lookup yields an empty token with the full max lifetime, so such
/// callers must treat an empty token as the failure signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub lifetime_seconds: u64,
    pub status: CredentialStatus,
}

impl Credential {
    pub fn minted(token: String, lifetime_seconds: u64) -> Self {
        Self { token, lifetime_seconds, status: CredentialStatus::Minted }
    }

    pub fn cached(token: String, lifetime_seconds: u64) -> Self {
        Self { token, lifetime_seconds, status: CredentialStatus::Cached }
    }

    pub fn stale(token: String, lifetime_seconds: u64, reason: CredentialError) -> Self {
        Self { token, lifetime_seconds, status: CredentialStatus::Stale(reason) }
    }

    pub fn failed(max_lifetime_seconds: u64, reason: CredentialError) -> Self {
        Self {
            token: TOKEN_VALUE_STUB.to_owned(),
            lifetime_seconds: max_lifetime_seconds,
            status: CredentialStatus::Failed(reason),
        }
    }

    /// Token can be handed out (possibly degraded).
    pub fn is_usable(&self) -> bool {
        !matches!(self.status, CredentialStatus::Failed(_)) && !self.token.is_empty()
    }

    pub fn error(&self) -> Option<&CredentialError> {
        match &self.status {
            CredentialStatus::Stale(e) | CredentialStatus::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_pair(self) -> (String, u64) {
        (self.token, self.lifetime_seconds)
    }
}
