//! # Scitoken Callout Library
//!
//! Resolves a `(group, entry)` pair to a bearer token for a grid front-end.
//! Tokens are minted by an external issuer command, cached on disk one file
//! per pair, and renewed shortly before they expire.
//!
//! Modules:
//! - `config` — issuer and cache configuration, YAML loading and validation
//! - `cache` — token requests, on-disk cache and credential outcomes
//! - `sources` — token minting through the external issuer command
//! - `sinks` — atomic token file writes

pub mod cache;
pub mod config;
pub mod errors;
pub mod helpers;
pub mod observability;
pub mod resilience;
pub mod sinks;
pub mod sources;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::cache::credential::{Credential, CredentialStatus};
pub use crate::cache::token_cache::TokenCache;
pub use crate::cache::token_request::EntryDescriptor;
pub use crate::config::issuer::{IssuerConfig, ServiceConfig};
pub use crate::errors::CredentialError;
