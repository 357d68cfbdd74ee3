use std::io::ErrorKind;
use std::path::Path;

use crate::errors::CredentialError;
use crate::helpers::time::age_seconds;

pub const TOKEN_VALUE_STUB: &'static str = "";

/// Token file as found on disk. The mtime stands in for the issuance time.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub contents: String,
    pub age_seconds: u64,
}

impl CachedToken {
    /// Age of the token file, `None` if there is no file.
    pub async fn age(path: &Path) -> Result<Option<u64>, CredentialError> {
        match tokio::fs::metadata(path).await {
            Ok(meta) => {
                let modified = meta
                    .modified()
                    .map_err(|e| CredentialError::StaleRead(format!("{}: {}", path.display(), e)))?;
                Ok(Some(age_seconds(modified)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CredentialError::StaleRead(format!("{}: {}", path.display(), e))),
        }
    }

    /// Read the whole file, trimmed; `age_seconds` is taken from the caller's age check.
    pub async fn read(path: &Path, age_seconds: u64) -> Result<Self, CredentialError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CredentialError::StaleRead(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            contents: raw.trim().to_owned(),
            age_seconds,
        })
    }

    /// Lifetime left out of `max_lifetime_seconds`.
    pub fn remaining_lifetime(&self, max_lifetime_seconds: u64) -> u64 {
        max_lifetime_seconds.saturating_sub(self.age_seconds)
    }
}
