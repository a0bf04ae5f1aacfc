//! On-disk cache for tokens obtained through the OAuth user flow or a
//! service-account exchange, so neither provider needs to re-authenticate on
//! every process start.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

const CACHE_FILE: &str = "token.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix timestamp the access token stops being valid.
    pub expires_at: u64,
}

impl CachedToken {
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

fn cache_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CACHE_FILE)
}

pub fn load(data_dir: &Path) -> AuthResult<Option<CachedToken>> {
    let path = cache_path(data_dir);
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(&path)
        .map_err(|e| AuthError::Storage(format!("failed to read {}: {e}", path.display())))?;
    let token = serde_json::from_str(&contents)
        .map_err(|e| AuthError::Storage(format!("failed to parse {}: {e}", path.display())))?;
    Ok(Some(token))
}

pub fn save(data_dir: &Path, token: &CachedToken) -> AuthResult<()> {
    fs::create_dir_all(data_dir)
        .map_err(|e| AuthError::Storage(format!("failed to create {}: {e}", data_dir.display())))?;

    let path = cache_path(data_dir);
    let contents = serde_json::to_string_pretty(token)
        .map_err(|e| AuthError::Storage(format!("failed to serialize token: {e}")))?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, &contents)
        .map_err(|e| AuthError::Storage(format!("failed to write {}: {e}", temp_path.display())))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600)).map_err(|e| {
            AuthError::Storage(format!(
                "failed to set permissions on {}: {e}",
                temp_path.display()
            ))
        })?;
    }

    fs::rename(&temp_path, &path).map_err(|e| {
        AuthError::Storage(format!(
            "failed to rename {} to {}: {e}",
            temp_path.display(),
            path.display()
        ))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_and_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let token = CachedToken {
            access_token: "abc".into(),
            refresh_token: Some("def".into()),
            expires_at: 100,
        };
        save(dir.path(), &token).unwrap();
        let loaded = load(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.access_token, "abc");
        assert_eq!(loaded.refresh_token.as_deref(), Some("def"));
    }

    #[test]
    fn load_missing_returns_none() {
        let dir = TempDir::new().unwrap();
        assert!(load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn is_expired_compares_against_now() {
        let token = CachedToken {
            expires_at: 100,
            ..Default::default()
        };
        assert!(token.is_expired(100));
        assert!(!token.is_expired(99));
    }

    #[cfg(unix)]
    #[test]
    fn cache_file_has_restricted_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        save(dir.path(), &CachedToken::default()).unwrap();
        let metadata = fs::metadata(cache_path(dir.path())).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }
}
