use std::path::Path;
use crate::config::issuer::ServiceConfig;
use crate::config::proc_initiator::initiate_default_values;
use crate::config::proc_validator;
use crate::observability::metrics::get_metrics;
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use tracing::{debug, error};

/// Load and validate config from YAML file
pub async fn file_to_config(path: &Path) -> Result<ServiceConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read config {}", path.display()))?;

    let expanded = expand_env_vars(&content);
    parse_config(expanded).await
}

pub async fn parse_config(content: String) -> Result<ServiceConfig> {
    let metrics = get_metrics().await;
    let mut service_config: ServiceConfig = serde_yaml::from_str(&content)
        .inspect_err(|e| {
            error!("parse config error: {}", e);
            metrics.config_parse_failures.inc();
        })?;

    service_config = initiate_default_values(service_config);
    debug!("validation config ...");
    proc_validator::validate_service_config(&service_config)
        .await
        .map_err(|errors| anyhow!("config is not valid: {}", errors.join("; ")))?;

    Ok(service_config)
}

/// Replace `${VAR}` and `${VAR:default}` with environment values.
fn expand_env_vars(input: &str) -> String {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}").expect("static regex");
    re.replace_all(input, |caps: &regex::Captures| {
        let var = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(var).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn env_vars_expand_with_defaults() {
        std::env::set_var("SCITOKEN_TEST_KEY_ID", "abcd");
        std::env::remove_var("SCITOKEN_TEST_MISSING");
        let out = expand_env_vars("id: ${SCITOKEN_TEST_KEY_ID}\ndir: ${SCITOKEN_TEST_MISSING:/tmp/t}\nx: ${SCITOKEN_TEST_MISSING}");
        assert_eq!(out, "id: abcd\ndir: /tmp/t\nx: ");
        std::env::remove_var("SCITOKEN_TEST_KEY_ID");
    }

    #[tokio::test]
    #[serial]
    async fn file_to_config_reads_expands_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("callout.yaml");
        std::env::set_var("SCITOKEN_TEST_CACHE_DIR", "/srv/tokens.d");
        std::fs::write(
            &path,
            r#"
settings:
  cache:
    dir: ${SCITOKEN_TEST_CACHE_DIR}
issuer:
  key_id: "5678"
  url: https://issuer.example.org
  max_lifetime_seconds: 7200
"#,
        )
        .unwrap();

        let cfg = file_to_config(&path).await.unwrap();
        std::env::remove_var("SCITOKEN_TEST_CACHE_DIR");

        assert_eq!(cfg.settings.cache.dir, "/srv/tokens.d");
        assert_eq!(cfg.settings.cache.staging_dir.as_deref(), Some("/srv/tokens.d"));
        assert_eq!(cfg.issuer.key_id, "5678");
        assert_eq!(cfg.issuer.max_lifetime_seconds, 7200);
        assert_eq!(cfg.issuer.renew_margin_seconds, 600);
        assert!(cfg.settings.logging.is_some());
    }

    #[tokio::test]
    #[serial]
    async fn deploy_config_is_valid() {
        let path = Path::new("deploy/scitoken-callout.yaml");
        let cfg = file_to_config(path)
            .await
            .expect("deploy/scitoken-callout.yaml must exist in repo root for tests");
        assert_eq!(cfg.issuer.command, "/usr/bin/scitokens-admin-create-token");
        assert!(cfg.issuer.retry.is_none());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let res = file_to_config(Path::new("/nonexistent/scitoken-callout.yaml")).await;
        assert!(res.is_err());
    }
}
