use serde::Deserialize;

use crate::config::settings::{RetryConfig, SettingsConfig};
use crate::utils::constants::*;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub issuer: IssuerConfig,
}

/// ================================
/// Issuer - key material and claims
/// ================================
/// Immutable for the process lifetime; injected into the cache and the minter.
#[derive(Debug, Deserialize, Clone)]
pub struct IssuerConfig {
    #[serde(default = "default_key_file")]
    pub key_file: String,
    #[serde(default = "default_key_id")]
    pub key_id: String,
    #[serde(default = "default_issuer_url")]
    pub url: String,
    /// space-delimited list of permitted actions
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_wlcg_version")]
    pub wlcg_version: String,
    #[serde(default = "default_max_lifetime_seconds")]
    pub max_lifetime_seconds: u64,
    /// invariant: < max_lifetime_seconds
    #[serde(default = "default_renew_margin_seconds")]
    pub renew_margin_seconds: u64,
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
    /// absolute path to the token minting executable
    #[serde(default = "default_command")]
    pub command: String,
    #[serde(default = "default_command_timeout_seconds")]
    pub command_timeout_seconds: u64,
    pub retry: Option<RetryConfig>,
}

impl IssuerConfig {
    /// Age (seconds) from which a cached token gets re-minted.
    pub fn renew_after_seconds(&self) -> u64 {
        self.max_lifetime_seconds.saturating_sub(self.renew_margin_seconds)
    }
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            key_file: default_key_file(),
            key_id: default_key_id(),
            url: default_issuer_url(),
            scope: default_scope(),
            wlcg_version: default_wlcg_version(),
            max_lifetime_seconds: default_max_lifetime_seconds(),
            renew_margin_seconds: default_renew_margin_seconds(),
            subject_prefix: default_subject_prefix(),
            command: default_command(),
            command_timeout_seconds: default_command_timeout_seconds(),
            retry: None,
        }
    }
}

fn default_key_file() -> String {
    DEFAULT_KEY_FILE.to_string()
}

fn default_key_id() -> String {
    DEFAULT_KEY_ID.to_string()
}

fn default_issuer_url() -> String {
    DEFAULT_ISSUER_URL.to_string()
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

fn default_wlcg_version() -> String {
    DEFAULT_WLCG_VERSION.to_string()
}

fn default_max_lifetime_seconds() -> u64 {
    DEFAULT_MAX_LIFETIME_SECS
}

fn default_renew_margin_seconds() -> u64 {
    DEFAULT_RENEW_MARGIN_SECS
}

fn default_subject_prefix() -> String {
    DEFAULT_SUBJECT_PREFIX.to_string()
}

fn default_command() -> String {
    DEFAULT_MINT_COMMAND.to_string()
}

fn default_command_timeout_seconds() -> u64 {
    DEFAULT_MINT_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_reference_deployment() {
        let cfg: ServiceConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg.issuer.max_lifetime_seconds, 3600);
        assert_eq!(cfg.issuer.renew_after_seconds(), 3000);
        assert_eq!(cfg.issuer.url, "https://scitokens.org/osg-connect");
        assert_eq!(cfg.settings.cache.dir, "/var/lib/gwms-frontend/tokens.d");
        assert!(cfg.settings.logging.is_none());
    }

    #[test]
    fn margin_larger_than_lifetime_renews_always() {
        let issuer = IssuerConfig {
            max_lifetime_seconds: 300,
            renew_margin_seconds: 600,
            ..IssuerConfig::default()
        };
        assert_eq!(issuer.renew_after_seconds(), 0);
    }
}
