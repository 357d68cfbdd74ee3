//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Validates:
//!   * cache and staging directories are absolute and share a filesystem
//!   * issuer key material, URL, scope and claims
//!   * lifetime / renew margin / timeout invariants
//!   * retry and logging invariants

use std::os::unix::fs::MetadataExt;
use std::path::Path;
use tracing::{error, info};

use crate::config::issuer::{IssuerConfig, ServiceConfig};
use crate::config::settings::{LoggingConfig, RetryConfig, SettingsConfig};
use crate::observability::metrics::get_metrics;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_staging_filesystem(&cfg.settings, &mut errors).await;
    validate_issuer(&cfg.issuer, &mut errors);

    if errors.is_empty() {
        info!("config is valid");
        Ok(())
    } else {
        let metrics = get_metrics().await;
        metrics.config_validation_errors.inc_by(errors.len() as u64);
        for e in &errors {
            error!("config: {}", e);
        }
        Err(errors)
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    validate_absolute_path("settings.cache.dir", &settings.cache.dir, errors);
    if let Some(staging_dir) = &settings.cache.staging_dir {
        validate_absolute_path("settings.cache.staging_dir", staging_dir, errors);
    }
    if let Some(textfile_path) = &settings.metrics.textfile_path {
        validate_absolute_path("settings.metrics.textfile_path", textfile_path, errors);
    }
    if let Some(logging) = &settings.logging {
        validate_logging(logging, errors);
    }
}

/// Temp files are renamed into the cache dir; a rename across devices fails with EXDEV.
async fn validate_staging_filesystem(settings: &SettingsConfig, errors: &mut Vec<String>) {
    let cache_dir = Path::new(&settings.cache.dir);
    let staging_dir = match &settings.cache.staging_dir {
        Some(staging_dir) if Path::new(staging_dir) != cache_dir => Path::new(staging_dir),
        _ => return,
    };
    if !cache_dir.is_absolute() || !staging_dir.is_absolute() {
        return;
    }

    // either may not exist yet; compare the closest existing ancestors
    if let (Some(cache_dev), Some(staging_dev)) =
        (existing_device(cache_dir).await, existing_device(staging_dir).await)
    {
        if cache_dev != staging_dev {
            errors.push(format!(
                "settings.cache.staging_dir '{}' must be on the same filesystem as settings.cache.dir '{}'",
                staging_dir.display(),
                cache_dir.display()
            ));
        }
    }
}

async fn existing_device(path: &Path) -> Option<u64> {
    for ancestor in path.ancestors() {
        if let Ok(meta) = tokio::fs::metadata(ancestor).await {
            return Some(meta.dev());
        }
    }
    None
}

fn validate_logging(logging: &LoggingConfig, errors: &mut Vec<String>) {
    if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
        errors.push(format!(
            "settings.logging.level '{}' must be one of {:?}",
            logging.level, LOG_LEVELS
        ));
    }
}

fn validate_issuer(issuer: &IssuerConfig, errors: &mut Vec<String>) {
    validate_absolute_path("issuer.key_file", &issuer.key_file, errors);
    validate_absolute_path("issuer.command", &issuer.command, errors);

    if issuer.key_id.trim().is_empty() {
        errors.push("issuer.key_id must not be empty".to_string());
    }
    if !(issuer.url.starts_with("https://") || issuer.url.starts_with("http://")) {
        errors.push(format!("issuer.url '{}' must be an http(s) URL", issuer.url));
    }
    if issuer.scope.split_whitespace().next().is_none() {
        errors.push("issuer.scope must list at least one permitted action".to_string());
    }
    if issuer.wlcg_version.trim().is_empty() {
        errors.push("issuer.wlcg_version must not be empty".to_string());
    }
    if issuer.max_lifetime_seconds == 0 {
        errors.push("issuer.max_lifetime_seconds must be > 0".to_string());
    }
    if issuer.renew_margin_seconds >= issuer.max_lifetime_seconds {
        errors.push(format!(
            "issuer.renew_margin_seconds ({}) must be < max_lifetime_seconds ({})",
            issuer.renew_margin_seconds, issuer.max_lifetime_seconds
        ));
    }
    if issuer.command_timeout_seconds == 0 {
        errors.push("issuer.command_timeout_seconds must be > 0".to_string());
    }
    if issuer.subject_prefix.contains(char::is_whitespace) {
        errors.push("issuer.subject_prefix must not contain whitespace".to_string());
    }
    if let Some(retry) = &issuer.retry {
        validate_retry("issuer.retry", retry, errors);
    }
}

fn validate_retry(ctx: &str, retry: &RetryConfig, errors: &mut Vec<String>) {
    if let Some(attempts) = retry.attempts {
        if attempts == 0 {
            errors.push(format!("{}.attempts must be >= 1", ctx));
        }
    }
    if let (Some(base), Some(max)) = (retry.base_delay_ms, retry.max_delay_ms) {
        if max < base {
            errors.push(format!(
                "{}.max_delay_ms ({}) must be >= base_delay_ms ({})",
                ctx, max, base
            ));
        }
    }
}

fn validate_absolute_path(ctx: &str, path: &str, errors: &mut Vec<String>) {
    if path.trim().is_empty() {
        errors.push(format!("{} must not be empty", ctx));
    } else if !Path::new(path).is_absolute() {
        errors.push(format!("{} '{}' is relative; absolute path required", ctx, path));
    }
}
