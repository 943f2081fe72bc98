use crate::error::{Error, Result};
use directories::{BaseDirs, UserDirs};
use liblecture::Settings;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Sub directory used under the config, cache and downloads roots
pub const APP_DIR: &str = "lectureManager";
const CREDENTIALS_FILE: &str = "cache.json";
const SETTINGS_FILE: &str = "settings.json";

/// Token and base url as persisted between runs
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: Option<String>,
    pub base: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct ResolvedCredentials {
    pub credentials: Credentials,
    /// Where the session cache lives, None when no cache root is known
    pub cache_dir: Option<PathBuf>,
}

pub fn default_config_root() -> Option<PathBuf> {
    BaseDirs::new().map(|d| d.config_dir().to_path_buf())
}

pub fn default_cache_root() -> Option<PathBuf> {
    BaseDirs::new().map(|d| d.cache_dir().to_path_buf())
}

/// `~/Downloads/lectureManager`, created when `~/Downloads` exists.
pub fn default_output_dir() -> Option<PathBuf> {
    let downloads = UserDirs::new()?.download_dir()?.to_path_buf();
    if !downloads.exists() {
        return None;
    }
    let dir = downloads.join(APP_DIR);
    if !dir.exists() && fs::create_dir(&dir).is_err() {
        return None;
    }
    Some(dir)
}

/// Combines the token/base flags with the ones saved under `cache_root`.
///
/// Flags win over the saved values. Unless `no_cache` is set, given flags are
/// written back so the next run can omit them.
pub fn resolve_credentials(
    token: Option<String>,
    base: Option<String>,
    cache_root: Option<&Path>,
    no_cache: bool,
) -> Result<ResolvedCredentials> {
    let flags = Credentials { token, base };
    let cache_root = match cache_root {
        Some(r) => r,
        None => {
            return Ok(ResolvedCredentials {
                credentials: flags,
                cache_dir: None,
            })
        }
    };

    let app_dir = cache_root.join(APP_DIR);
    let file = app_dir.join(CREDENTIALS_FILE);

    let credentials = if file.exists() {
        if flags.token.is_none() && flags.base.is_none() {
            read_json(&file)?
        } else if !no_cache {
            let mut saved: Credentials = read_json(&file)?;
            if flags.token.is_some() {
                saved.token = flags.token;
            }
            if flags.base.is_some() {
                saved.base = flags.base;
            }
            write_json(&file, &saved)?;
            saved
        } else {
            flags
        }
    } else {
        if flags.token.is_some() && flags.base.is_some() && !no_cache {
            create_dir(&app_dir)?;
            write_json(&file, &flags)?;
        }
        flags
    };

    create_dir(&app_dir)?;
    Ok(ResolvedCredentials {
        credentials,
        cache_dir: Some(app_dir),
    })
}

/// Reads settings.json under `config_root`, writing a template on first use.
pub fn load_settings(config_root: Option<&Path>) -> Result<Settings> {
    let config_root = match config_root {
        Some(r) => r,
        None => return Ok(Settings::default()),
    };
    let app_dir = config_root.join(APP_DIR);
    let file = app_dir.join(SETTINGS_FILE);
    if file.exists() {
        return read_json(&file);
    }

    let template = Settings {
        aliases: HashMap::from([("DIRNAME".to_string(), "ALIAS".to_string())]),
        folders: HashSet::from(["DIRNAME".to_string()]),
    };
    create_dir(&app_dir)?;
    write_json(&file, &template)?;
    println!("wrote settings template to {}", file.to_string_lossy());
    Ok(template)
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| Error::file_op(dir, e))
}

fn read_json<T: for<'de> Deserialize<'de>>(file: &Path) -> Result<T> {
    let content = fs::read_to_string(file).map_err(|e| Error::file_op(file, e))?;
    serde_json::from_str(&content).map_err(|e| Error::InvalidFile {
        file_name: file.to_string_lossy().to_string(),
        message: e.to_string(),
    })
}

fn write_json<T: Serialize>(file: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string(value).map_err(|e| Error::InvalidFile {
        file_name: file.to_string_lossy().to_string(),
        message: e.to_string(),
    })?;
    fs::write(file, content).map_err(|e| Error::file_op(file, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved(root: &Path) -> Credentials {
        read_json(&root.join(APP_DIR).join(CREDENTIALS_FILE)).unwrap()
    }

    fn creds(token: &str, base: &str) -> Credentials {
        Credentials {
            token: Some(token.to_string()),
            base: Some(base.to_string()),
        }
    }

    #[test]
    fn test_first_run_persists_flags() {
        let tmp = tempfile::tempdir().unwrap();
        let resolved = resolve_credentials(
            Some("t".to_string()),
            Some("https://x".to_string()),
            Some(tmp.path()),
            false,
        )
        .unwrap();
        assert_eq!(resolved.credentials, creds("t", "https://x"));
        assert_eq!(resolved.cache_dir, Some(tmp.path().join(APP_DIR)));
        assert_eq!(saved(tmp.path()), creds("t", "https://x"));
    }

    #[test]
    fn test_saved_credentials_used_without_flags() {
        let tmp = tempfile::tempdir().unwrap();
        resolve_credentials(
            Some("t".to_string()),
            Some("https://x".to_string()),
            Some(tmp.path()),
            false,
        )
        .unwrap();
        let resolved = resolve_credentials(None, None, Some(tmp.path()), false).unwrap();
        assert_eq!(resolved.credentials, creds("t", "https://x"));
    }

    #[test]
    fn test_single_flag_overrides_saved_value() {
        let tmp = tempfile::tempdir().unwrap();
        resolve_credentials(
            Some("t".to_string()),
            Some("https://x".to_string()),
            Some(tmp.path()),
            false,
        )
        .unwrap();
        let resolved =
            resolve_credentials(Some("fresh".to_string()), None, Some(tmp.path()), false).unwrap();
        assert_eq!(resolved.credentials, creds("fresh", "https://x"));
        assert_eq!(saved(tmp.path()), creds("fresh", "https://x"));
    }

    #[test]
    fn test_no_cache_leaves_file_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let resolved = resolve_credentials(
            Some("t".to_string()),
            Some("https://x".to_string()),
            Some(tmp.path()),
            true,
        )
        .unwrap();
        assert_eq!(resolved.credentials, creds("t", "https://x"));
        assert!(!tmp.path().join(APP_DIR).join(CREDENTIALS_FILE).exists());
    }

    #[test]
    fn test_settings_template_written_once() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = load_settings(Some(tmp.path())).unwrap();
        assert!(settings.folders.contains("DIRNAME"));
        assert_eq!(settings.aliases["DIRNAME"], "ALIAS");

        let file = tmp.path().join(APP_DIR).join(SETTINGS_FILE);
        fs::write(&file, r#"{"aliases":{},"folders":["CS101"]}"#).unwrap();
        let settings = load_settings(Some(tmp.path())).unwrap();
        assert!(settings.folders.contains("CS101"));
        assert!(settings.aliases.is_empty());
    }

    #[test]
    fn test_malformed_settings_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join(APP_DIR)).unwrap();
        fs::write(tmp.path().join(APP_DIR).join(SETTINGS_FILE), "[").unwrap();
        assert!(matches!(
            load_settings(Some(tmp.path())),
            Err(Error::InvalidFile { .. })
        ));
    }
}
