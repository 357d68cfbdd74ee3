//! Shared constants and invariants

/// Defaults matching the reference deployment of the callout.
pub const DEFAULT_CACHE_DIR: &str = "/var/lib/gwms-frontend/tokens.d";
pub const DEFAULT_KEY_FILE: &str = "/etc/condor/scitokens.pem";
pub const DEFAULT_KEY_ID: &str = "1234";
pub const DEFAULT_ISSUER_URL: &str = "https://scitokens.org/osg-connect";
pub const DEFAULT_SCOPE: &str = "compute.read compute.modify compute.create compute.cancel";
pub const DEFAULT_WLCG_VERSION: &str = "1.0";
pub const DEFAULT_MAX_LIFETIME_SECS: u64 = 3600;
/// renew slightly before the token expires
pub const DEFAULT_RENEW_MARGIN_SECS: u64 = 600;
pub const DEFAULT_SUBJECT_PREFIX: &str = "vofrontend-";
pub const DEFAULT_MINT_COMMAND: &str = "/usr/bin/scitokens-admin-create-token";
pub const DEFAULT_MINT_TIMEOUT_SECS: u64 = 60;

pub const TOKEN_FILE_SUFFIX: &str = "scitoken";
pub const CACHE_DIR_MODE: u32 = 0o700;
pub const TOKEN_FILE_MODE: u32 = 0o600;
