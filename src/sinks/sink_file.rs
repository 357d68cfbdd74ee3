use std::fs::Permissions;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tokio::fs::DirBuilder;
use tracing::debug;

use crate::errors::CredentialError;
use crate::utils::constants::{CACHE_DIR_MODE, TOKEN_FILE_MODE};

/// Create the cache directory (and parents) owner-only if it is missing.
pub async fn ensure_cache_dir(dir: &Path) -> Result<(), CredentialError> {
    if tokio::fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Ok(());
    }
    DirBuilder::new()
        .recursive(true)
        .mode(CACHE_DIR_MODE)
        .create(dir)
        .await
        .map_err(|e| CredentialError::Configuration(format!("{}: {}", dir.display(), e)))?;
    debug!("created cache dir {}", dir.display());
    Ok(())
}

/// Write `token` to `path` so readers see either the old file or the complete new one.
///
/// The token goes to a fresh temp file in `staging_dir` first and is then
/// renamed over `path`. A temp file that is not renamed is removed when its
/// handle drops, on every error path.
pub async fn write_token_atomically(
    path: &Path,
    staging_dir: &Path,
    token: &str,
) -> Result<(), CredentialError> {
    let path: PathBuf = path.to_owned();
    let staging_dir: PathBuf = staging_dir.to_owned();
    let token = token.to_owned();

    tokio::task::spawn_blocking(move || persist_token(&path, &staging_dir, &token))
        .await
        .map_err(|e| CredentialError::Io(format!("token writer task: {}", e)))?
}

fn persist_token(path: &Path, staging_dir: &Path, token: &str) -> Result<(), CredentialError> {
    let io_err = |what: &str, e: std::io::Error| CredentialError::Io(format!("{} {}: {}", what, path.display(), e));

    let prefix = path
        .file_name()
        .map(|name| format!(".{}.", name.to_string_lossy()))
        .unwrap_or_else(|| ".token.".to_string());

    // tempfile creates the file 0600
    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(staging_dir)
        .map_err(|e| io_err("create temp file for", e))?;

    tmp.write_all(token.as_bytes()).map_err(|e| io_err("write temp file for", e))?;
    tmp.as_file().sync_all().map_err(|e| io_err("sync temp file for", e))?;

    // on failure the returned PersistError owns the temp file and deletes it on drop
    tmp.persist(path).map_err(|e| io_err("rename into", e.error))?;

    std::fs::set_permissions(path, Permissions::from_mode(TOKEN_FILE_MODE))
        .map_err(|e| io_err("chmod", e))?;
    Ok(())
}
