use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use crate::cache::credential::Credential;
use crate::cache::key_lock::KeyLocks;
use crate::cache::token::CachedToken;
use crate::cache::token_request::{EntryDescriptor, TokenRequest};
use crate::config::issuer::{IssuerConfig, ServiceConfig};
use crate::config::settings::CacheConfig;
use crate::errors::CredentialError;
use crate::observability::metrics::get_metrics;
use crate::sinks::sink_file::{ensure_cache_dir, write_token_atomically};
use crate::sources::scitokens_admin::ScitokensAdminMinter;
use crate::sources::{MintRequest, MintToken};

/// Write-through disk cache: one token file per `(group, entry)` pair,
/// re-minted once less than `renew_margin_seconds` of its lifetime is left.
#[derive(Debug)]
pub struct TokenCache<M> {
    issuer: Arc<IssuerConfig>,
    cache_dir: PathBuf,
    staging_dir: PathBuf,
    minter: M,
    locks: KeyLocks,
}

impl TokenCache<ScitokensAdminMinter> {
    /// Cache backed by the external minting command from `config.issuer`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let issuer = Arc::new(config.issuer.clone());
        let minter = ScitokensAdminMinter::new(issuer.clone());
        Self::new(issuer, &config.settings.cache, minter)
    }
}

impl<M> TokenCache<M>
where
    M: MintToken + Send + Sync,
{
    pub fn new(issuer: Arc<IssuerConfig>, cache: &CacheConfig, minter: M) -> Self {
        let cache_dir = PathBuf::from(&cache.dir);
        let staging_dir = cache
            .staging_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| cache_dir.clone());
        Self {
            issuer,
            cache_dir,
            staging_dir,
            minter,
            locks: KeyLocks::new(),
        }
    }

    pub fn token_path(&self, request: &TokenRequest) -> PathBuf {
        self.cache_dir.join(request.file_name())
    }

    /// Cached token for the pair, minting a new one when it is missing or about to expire.
    /// Never fails; problems are reported through the credential status.
    pub async fn get_credential(
        &self,
        group: &str,
        entry: &EntryDescriptor,
        trust_domain: Option<&str>,
    ) -> Credential {
        self.resolve(group, entry, trust_domain, false).await
    }

    /// Like `get_credential` but always mints.
    pub async fn refresh_credential(
        &self,
        group: &str,
        entry: &EntryDescriptor,
        trust_domain: Option<&str>,
    ) -> Credential {
        self.resolve(group, entry, trust_domain, true).await
    }

    async fn resolve(
        &self,
        group: &str,
        entry: &EntryDescriptor,
        trust_domain: Option<&str>,
        force: bool,
    ) -> Credential {
        // trust domain is reserved for VO specific issuers
        trace!("credential for group '{}', entry {:?}, trust domain {:?}", group, entry.name, trust_domain);

        let request = match TokenRequest::new(group, entry) {
            Ok(request) => request,
            Err(err) => {
                warn!("rejected credential request for group '{}': {}", group.escape_default(), err);
                get_metrics().await.mint_failures.with_label_values(&["invalid", err.reason()]).inc();
                return Credential::failed(self.issuer.max_lifetime_seconds, err);
            }
        };

        let _guard = self.locks.lock(&request.cache_key()).await;
        let path = self.token_path(&request);
        self.resolve_locked(&request, &path, force).await
    }

    async fn resolve_locked(&self, request: &TokenRequest, path: &Path, force: bool) -> Credential {
        let max_lifetime = self.issuer.max_lifetime_seconds;

        if let Err(err) = self.ensure_dirs().await {
            return self.degrade(request, path, err, None).await;
        }

        // no file: treated as infinitely old
        let age = match CachedToken::age(path).await {
            Ok(age) => age,
            Err(err) => return self.degrade(request, path, err, None).await,
        };

        let due = age.map(|age| age >= self.issuer.renew_after_seconds()).unwrap_or(true);
        if let Some(age) = age.filter(|_| !force && !due) {
            match CachedToken::read(path, age).await {
                Ok(cached) if !cached.contents.is_empty() => {
                    get_metrics().await.cache_hits.with_label_values(&[request.group.as_str()]).inc();
                    debug!("using cached token {}, age {}s", path.display(), age);
                    let remaining = cached.remaining_lifetime(max_lifetime);
                    return Credential::cached(cached.contents, remaining);
                }
                Ok(_) => info!("cached token {} is empty, renewing", path.display()),
                Err(err) => return self.degrade(request, path, err, None).await,
            }
        }

        match self.mint_and_store(request, path).await {
            Ok(token) => Credential::minted(token, max_lifetime),
            Err(err) => self.degrade(request, path, err, age).await,
        }
    }

    async fn ensure_dirs(&self) -> Result<(), CredentialError> {
        ensure_cache_dir(&self.cache_dir).await?;
        if self.staging_dir != self.cache_dir {
            ensure_cache_dir(&self.staging_dir).await?;
        }
        Ok(())
    }

    async fn mint_and_store(&self, request: &TokenRequest, path: &Path) -> Result<String, CredentialError> {
        let metrics = get_metrics().await;
        let mint_request = MintRequest {
            subject: request.subject(&self.issuer.subject_prefix),
            audience: request.audience(),
        };

        metrics.mint_requests.with_label_values(&[request.group.as_str()]).inc();
        let start = Instant::now();
        let minted = self.minter.mint_token(&mint_request).await;
        metrics
            .mint_duration
            .with_label_values(&[request.group.as_str()])
            .observe(start.elapsed().as_secs_f64());
        let token = minted?;

        write_token_atomically(path, &self.staging_dir, &token).await?;
        debug!("created token {}", path.display());
        Ok(token)
    }

    /// Failure path: log, count, and serve the previous token while it is still valid.
    async fn degrade(
        &self,
        request: &TokenRequest,
        path: &Path,
        err: CredentialError,
        age: Option<u64>,
    ) -> Credential {
        let max_lifetime = self.issuer.max_lifetime_seconds;
        let metrics = get_metrics().await;
        warn!("failed to create {}: {}", path.display(), err);
        metrics
            .mint_failures
            .with_label_values(&[request.group.as_str(), err.reason()])
            .inc();

        if let Some(age) = age.filter(|age| *age < max_lifetime) {
            if let Ok(previous) = CachedToken::read(path, age).await {
                if !previous.contents.is_empty() {
                    metrics.stale_served.with_label_values(&[request.group.as_str()]).inc();
                    let remaining = previous.remaining_lifetime(max_lifetime);
                    info!("serving previous token {}, {}s left", path.display(), remaining);
                    return Credential::stale(previous.contents, remaining, err);
                }
            }
        }
        Credential::failed(max_lifetime, err)
    }
}
