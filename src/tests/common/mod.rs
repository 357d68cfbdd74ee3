// shared helpers for cache tests
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use crate::cache::token_cache::TokenCache;
use crate::cache::token_request::EntryDescriptor;
use crate::config::issuer::IssuerConfig;
use crate::config::settings::CacheConfig;
use crate::errors::CredentialError;
use crate::sources::{MintRequest, MintToken};

/// In-process minter that counts calls and returns `<prefix>-<call number>`.
#[derive(Clone)]
pub struct FakeMinter {
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<MintRequest>>>,
    outcome: Arc<Mutex<Result<String, CredentialError>>>,
    delay: Duration,
}

impl FakeMinter {
    pub fn ok(prefix: &str) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            outcome: Arc::new(Mutex::new(Ok(prefix.to_owned()))),
            delay: Duration::ZERO,
        }
    }

    pub fn failing(reason: &str) -> Self {
        let minter = Self::ok("unused");
        minter.fail_with(reason);
        minter
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fail_with(&self, reason: &str) {
        *self.outcome.lock().unwrap() = Err(CredentialError::MintingFailure(reason.to_owned()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<MintRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl MintToken for FakeMinter {
    async fn mint_token(&self, request: &MintRequest) -> Result<String, CredentialError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());
        let outcome = self.outcome.lock().unwrap().clone();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        outcome.map(|prefix| format!("{}-{}", prefix, n))
    }
}

pub fn cache_config(dir: &Path) -> CacheConfig {
    CacheConfig {
        dir: dir.to_string_lossy().into_owned(),
        staging_dir: None,
    }
}

pub fn fake_cache(dir: &Path, minter: &FakeMinter) -> TokenCache<FakeMinter> {
    TokenCache::new(Arc::new(IssuerConfig::default()), &cache_config(dir), minter.clone())
}

pub fn entry(name: &str, gatekeeper: &str) -> EntryDescriptor {
    EntryDescriptor::new(Some(name.to_owned()), Some(gatekeeper.to_owned()))
}

/// Backdate the file mtime, which the cache reads as the token age.
pub fn set_age(path: &Path, age_seconds: u64) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(age_seconds)).unwrap();
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn mode(path: &Path) -> u32 {
    fs::metadata(path).unwrap().permissions().mode() & 0o777
}

/// Executable `/bin/sh` script, returns its path.
pub fn write_script(dir: &Path, name: &str, body: &str) -> String {
    let path: PathBuf = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}
