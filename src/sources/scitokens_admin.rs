use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, trace};

use crate::config::issuer::IssuerConfig;
use crate::errors::CredentialError;
use crate::resilience::retry::RetrySettings;
use crate::sources::{validate_token_output, MintRequest, MintToken};

/// Mints tokens by running the scitokens admin command (or a compatible one).
#[derive(Debug, Clone)]
pub struct ScitokensAdminMinter {
    issuer: Arc<IssuerConfig>,
    retry: RetrySettings,
}

impl ScitokensAdminMinter {
    pub fn new(issuer: Arc<IssuerConfig>) -> Self {
        let retry = RetrySettings::from_config(&issuer.retry);
        Self { issuer, retry }
    }

    async fn run_once(&self, request: &MintRequest) -> Result<String, CredentialError> {
        let args = command_args(&self.issuer, request);
        trace!("running {} {:?}", self.issuer.command, args);

        let mut cmd = Command::new(&self.issuer.command);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let timeout_seconds = self.issuer.command_timeout_seconds;
        let output = tokio::time::timeout(Duration::from_secs(timeout_seconds), cmd.output())
            .await
            .map_err(|_| {
                CredentialError::MintingFailure(format!(
                    "{} timed out after {}s",
                    self.issuer.command, timeout_seconds
                ))
            })?
            .map_err(|e| CredentialError::MintingFailure(format!("{}: {}", self.issuer.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CredentialError::MintingFailure(format!(
                "{} exited with {}: {}",
                self.issuer.command,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| {
            CredentialError::MintingFailure(format!("{} printed non UTF-8 output", self.issuer.command))
        })?;
        validate_token_output(&stdout)
    }
}

impl MintToken for ScitokensAdminMinter {
    async fn mint_token(&self, request: &MintRequest) -> Result<String, CredentialError> {
        let token = self.retry.run_with_retry(move || self.run_once(request)).await?;
        debug!("minted token, sub={:?} aud={:?}", request.subject, request.audience);
        Ok(token)
    }
}

/// Flags first, then the claim assignments; unset claims are left out.
pub fn command_args(issuer: &IssuerConfig, request: &MintRequest) -> Vec<String> {
    let mut args = vec![
        "--keyfile".to_string(),
        issuer.key_file.to_owned(),
        "--key_id".to_string(),
        issuer.key_id.to_owned(),
        "--issuer".to_string(),
        issuer.url.to_owned(),
        "--lifetime".to_string(),
        issuer.max_lifetime_seconds.to_string(),
    ];
    if let Some(subject) = &request.subject {
        args.push(format!("sub={}", subject));
    }
    if let Some(audience) = &request.audience {
        args.push(format!("aud={}", audience));
    }
    args.push(format!("scope={}", issuer.scope));
    args.push(format!("wlcg.ver={}", issuer.wlcg_version));
    args
}
