//! Token sources
//!
//! The cache never signs anything itself; it asks a `MintToken` implementation
//! for a fresh bearer token whenever the cached one is due for renewal.

use crate::errors::CredentialError;

pub mod scitokens_admin;

/// Claims that vary per cache slot; key material and scope come from the issuer config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MintRequest {
    pub subject: Option<String>,
    pub audience: Option<String>,
}

pub trait MintToken {
    /// Mint one token and return its raw text.
    fn mint_token(
        &self,
        request: &MintRequest,
    ) -> impl std::future::Future<Output = Result<String, CredentialError>> + Send;
}

/// Reject output that cannot be a bearer token.
pub fn validate_token_output(raw: &str) -> Result<String, CredentialError> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(CredentialError::MintingFailure("minting command printed no token".to_string()));
    }
    if token.contains(char::is_whitespace) {
        return Err(CredentialError::MintingFailure(format!(
            "minting command printed {} bytes that are not a single token",
            token.len()
        )));
    }
    Ok(token.to_owned())
}
