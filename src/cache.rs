//! On-disk credential cache.
//!
//! One JSON file per role, named after the SHA-256 of the role ARN so distinct
//! roles never collide and the ARN's `:`/`/` never reach the filesystem:
//!
//! ```text
//! <state dir>/aws_mfa_credentials_cache_<sha256 hex>.json
//! ```
//!
//! Files are written with mode `0600` and always fully replaced. Stale or
//! corrupt files are left in place; the next successful STS call overwrites them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use sha2::{Digest, Sha256};
use tokio::{fs, io::AsyncWriteExt};

use crate::credentials::{CachedCredentials, CredentialProcessResponse};

/// Directory name under the platform state directory.
pub const APP_DIR_NAME: &str = "aws-mfa-helper";

const CACHE_FILE_PREFIX: &str = "aws_mfa_credentials_cache_";

/// Resolves the state directory: XDG state dir on Linux, falling back to the
/// platform data dir (roaming AppData on Windows, Application Support on macOS).
pub fn default_state_dir() -> Result<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::data_dir)
        .map(|dir| dir.join(APP_DIR_NAME))
        .context("Could not determine a state directory for the credential cache")
}

/// Creates `dir` (owner-only on Unix) if it does not exist yet. Existing directories keep their mode.
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder
        .create(dir)
        .await
        .with_context(|| format!("creating state directory {}", dir.display()))
}

/// Cache file path for `role_arn` inside `cache_dir`. Pure; touches no files.
pub fn cache_file_path(cache_dir: &Path, role_arn: &str) -> PathBuf {
    let digest = hex::encode(Sha256::digest(role_arn.as_bytes()));
    cache_dir.join(format!("{CACHE_FILE_PREFIX}{digest}.json"))
}

/// Reads and writes cached credentials under one directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, role_arn: &str) -> PathBuf {
        cache_file_path(&self.dir, role_arn)
    }

    /// Loads the cached response for `role_arn` regardless of its expiry.
    ///
    /// Returns `Ok(None)` when no cache file exists. Unreadable or undecodable
    /// files are errors; callers treat them as a cache miss.
    pub async fn load(&self, role_arn: &str) -> Result<Option<CredentialProcessResponse>> {
        let path = self.path_for(role_arn);
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache file at {}", path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading cache file {}", path.display()));
            }
        };

        let cached = CachedCredentials::decode(&data)
            .with_context(|| format!("parsing cache file {}", path.display()))?;
        Ok(Some(cached.credentials))
    }

    /// Replaces the cache file for `role_arn` with `response`, mode `0600`.
    pub async fn store(&self, response: &CredentialProcessResponse, role_arn: &str) -> Result<()> {
        let path = self.path_for(role_arn);
        let data = CachedCredentials::from(response.clone()).encode()?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&path)
            .await
            .with_context(|| format!("opening cache file {}", path.display()))?;

        // `mode` only applies on creation; tighten files left by older runs.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await
                .with_context(|| format!("restricting permissions of {}", path.display()))?;
        }

        file.write_all(&data)
            .await
            .with_context(|| format!("writing cache file {}", path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("writing cache file {}", path.display()))?;

        debug!("Cached credentials at {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const ROLE: &str = "arn:aws:iam::123456789012:role/R";

    fn response(expiration: &str) -> CredentialProcessResponse {
        CredentialProcessResponse::new("AK", "SK", "ST", expiration)
    }

    #[test]
    fn test_cache_file_path_is_deterministic() {
        let dir = Path::new("/state");
        let path = cache_file_path(dir, ROLE);
        assert_eq!(path, cache_file_path(dir, ROLE));
        assert_ne!(path, cache_file_path(dir, "arn:aws:iam::123456789012:role/S"));

        let name = path.file_name().unwrap().to_str().unwrap();
        let digest = name
            .strip_prefix("aws_mfa_credentials_cache_")
            .and_then(|rest| rest.strip_suffix(".json"))
            .unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_eq!(path.parent(), Some(dir));
    }

    #[test]
    fn test_cache_file_path_known_digest() {
        // sha256("abc")
        assert_eq!(
            cache_file_path(Path::new("d"), "abc"),
            Path::new("d").join(
                "aws_mfa_credentials_cache_ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad.json"
            )
        );
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path());
        assert!(store.load(ROLE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_then_load_ignores_expiry() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path());
        let stale = response("2000-01-01T00:00:00Z");

        store.store(&stale, ROLE).await.unwrap();
        assert_eq!(store.load(ROLE).await.unwrap(), Some(stale));
    }

    #[tokio::test]
    async fn test_store_replaces_longer_content() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path());
        let path = store.path_for(ROLE);
        std::fs::write(&path, "x".repeat(4096)).unwrap();

        let fresh = response("2999-01-01T00:00:00Z");
        store.store(&fresh, ROLE).await.unwrap();

        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(on_disk, CachedCredentials::from(fresh).encode().unwrap());
    }

    #[tokio::test]
    async fn test_load_corrupt_is_error_and_file_kept() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path());
        let path = store.path_for(ROLE);
        std::fs::write(&path, "not-json").unwrap();

        let err = store.load(ROLE).await.unwrap_err();
        assert!(format!("{err:#}").starts_with("parsing cache file"));
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_load_permission_denied_is_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path());
        store.store(&response("2999-01-01T00:00:00Z"), ROLE).await.unwrap();
        let path = store.path_for(ROLE);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users read through mode bits; nothing to check there.
        if std::fs::read(&path).is_ok() {
            return;
        }

        let err = store.load(ROLE).await.unwrap_err();
        assert!(format!("{err:#}").starts_with("reading cache file"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_load_unreadable_entry_is_error() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path());
        // A directory where the cache file should be cannot be read as a file.
        std::fs::create_dir(store.path_for(ROLE)).unwrap();

        let err = store.load(ROLE).await.unwrap_err();
        assert!(format!("{err:#}").starts_with("reading cache file"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_store_sets_owner_only_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path());
        let path = store.path_for(ROLE);
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        store.store(&response("2999-01-01T00:00:00Z"), ROLE).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_ensure_dir_creates_nested() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        ensure_dir(&nested).await.unwrap();

        std::fs::write(dir.path().join("file"), "").unwrap();
        assert!(ensure_dir(&dir.path().join("file")).await.is_err());
    }
}
