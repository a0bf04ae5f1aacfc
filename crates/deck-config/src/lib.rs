//! Configuration discovery: the on-disk config file whose keys front-matter
//! is allowed to override.
//!
//! Per spec this lives at `XDG_CONFIG_HOME/<app>/config[-profile].{yml,yaml}`
//! and carries the same keys front-matter does (`presentationID`, `title`,
//! `breaks`, `codeBlockToImageCommand`) plus two config-only keys
//! (`folderID`, `basePresentationID`) that have no front-matter equivalent
//! because they name where a *new* presentation is created, not an existing
//! one being synced. The merge itself — front-matter wins, config backs it
//! up — happens at the CLI boundary, which is the only layer that holds
//! both values.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const APP_NAME: &str = "deck";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config file {path} is not valid YAML: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// The config file's shape. Every field is optional: an absent key simply
/// means front-matter (or a flag, or a prompt) has to supply it instead.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigFile {
    #[serde(rename = "presentationID", default)]
    pub presentation_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub breaks: Option<bool>,
    #[serde(rename = "codeBlockToImageCommand", default)]
    pub code_block_to_image_command: Option<String>,
    #[serde(rename = "folderID", default)]
    pub folder_id: Option<String>,
    #[serde(rename = "basePresentationID", default)]
    pub base_presentation_id: Option<String>,
}

/// Where `deck`'s own runtime state (currently just the crash report) is
/// written: `XDG_STATE_HOME/<app>` falling back to the platform's ordinary
/// data directory when no state directory is reported.
pub fn state_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// Locates the config file for `profile` (`None` for the unsuffixed
/// default) under `XDG_CONFIG_HOME/<app>/`, trying `.yml` then `.yaml`.
/// Returns `None` when neither extension exists — that is not an error,
/// just "no config file", which [`load_discovered`] treats as an empty one.
pub fn discover(profile: Option<&str>) -> Option<PathBuf> {
    let dir = dirs::config_dir()?.join(APP_NAME);
    let stem = match profile {
        Some(profile) => format!("config-{profile}"),
        None => "config".to_string(),
    };
    ["yml", "yaml"]
        .into_iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|candidate| candidate.is_file())
}

/// Parses a config file at an explicit path. A missing file is the caller's
/// concern (see [`load_discovered`]); a present-but-malformed one is always
/// an error.
pub fn load(path: &Path) -> Result<ConfigFile, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Discovers and loads the config file for `profile`. No file at all is not
/// an error — it just yields the all-`None` default, same as a config file
/// that sets nothing.
pub fn load_discovered(profile: Option<&str>) -> Result<ConfigFile, ConfigError> {
    match discover(profile) {
        Some(path) => {
            tracing::info!(target: "deck_config", path = %path.display(), "loaded config file");
            load(&path)
        }
        None => {
            tracing::debug!(target: "deck_config", ?profile, "no config file found, using defaults");
            Ok(ConfigFile::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct XdgGuard {
        previous: Option<OsString>,
        _lock: std::sync::MutexGuard<'static, ()>,
    }

    impl XdgGuard {
        fn set(dir: &Path) -> Self {
            let lock = ENV_LOCK.lock().unwrap();
            let previous = std::env::var_os("XDG_CONFIG_HOME");
            unsafe { std::env::set_var("XDG_CONFIG_HOME", dir) };
            Self { previous, _lock: lock }
        }
    }

    impl Drop for XdgGuard {
        fn drop(&mut self) {
            match &self.previous {
                Some(value) => unsafe { std::env::set_var("XDG_CONFIG_HOME", value) },
                None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
            }
        }
    }

    #[test]
    fn state_dir_is_namespaced_under_the_app_name() {
        assert!(state_dir().ends_with(APP_NAME));
    }

    #[test]
    fn missing_config_file_yields_defaults_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let _guard = XdgGuard::set(tmp.path());
        let config = load_discovered(None).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn discovers_unsuffixed_yml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let app_dir = tmp.path().join(APP_NAME);
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(app_dir.join("config.yml"), "presentationID: abc123\n").unwrap();
        let _guard = XdgGuard::set(tmp.path());

        let config = load_discovered(None).unwrap();
        assert_eq!(config.presentation_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn profile_suffix_selects_the_matching_file() {
        let tmp = tempfile::tempdir().unwrap();
        let app_dir = tmp.path().join(APP_NAME);
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(app_dir.join("config.yml"), "title: Default\n").unwrap();
        std::fs::write(app_dir.join("config-work.yaml"), "title: Work\n").unwrap();
        let _guard = XdgGuard::set(tmp.path());

        assert_eq!(load_discovered(None).unwrap().title.as_deref(), Some("Default"));
        assert_eq!(load_discovered(Some("work")).unwrap().title.as_deref(), Some("Work"));
    }

    #[test]
    fn folder_and_base_presentation_keys_parse() {
        let tmp = tempfile::tempdir().unwrap();
        let app_dir = tmp.path().join(APP_NAME);
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(
            app_dir.join("config.yml"),
            "folderID: folder-1\nbasePresentationID: base-1\n",
        )
        .unwrap();
        let _guard = XdgGuard::set(tmp.path());

        let config = load_discovered(None).unwrap();
        assert_eq!(config.folder_id.as_deref(), Some("folder-1"));
        assert_eq!(config.base_presentation_id.as_deref(), Some("base-1"));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yml");
        std::fs::write(&path, "breaks: [unterminated\n").unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }
}
