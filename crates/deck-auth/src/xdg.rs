use std::path::PathBuf;

use crate::error::{AuthError, AuthResult};

const APP_DIR: &str = "deck";

/// `XDG_DATA_HOME/deck` (`~/.local/share/deck` on Linux) — where cached
/// tokens live.
pub fn default_data_dir() -> AuthResult<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| AuthError::Storage("could not determine XDG data directory".into()))?;
    Ok(data_dir.join(APP_DIR))
}

/// `XDG_CONFIG_HOME/deck` (`~/.config/deck` on Linux).
pub fn default_config_dir() -> AuthResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| AuthError::Storage("could not determine XDG config directory".into()))?;
    Ok(config_dir.join(APP_DIR))
}
