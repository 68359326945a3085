use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};

/// User-level configuration loaded from `~/.config/walletvault/config.toml` (platform-specific).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Namespace every wallet key is stored under.
    pub prefix: Option<String>,
    pub backend: BackendConfig,
    pub encryption: EncryptionConfig,
}

/// Where records are persisted.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BackendConfig {
    /// Object store kept on the local filesystem.
    Filesystem {
        /// Override for the data directory.
        root: Option<PathBuf>,
        #[serde(default = "default_bucket")]
        bucket: String,
    },
    /// KV-style secret service reached over HTTP.
    SecretService {
        address: String,
        #[serde(default = "default_mount")]
        mount: String,
        /// Falls back to `WALLETVAULT_TOKEN` when unset.
        token: Option<String>,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Filesystem {
            root: None,
            bucket: default_bucket(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct EncryptionConfig {
    pub enabled: bool,
    /// OS keyring entry holding the store key.
    pub keyring_service: String,
    pub keyring_account: String,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keyring_service: "walletvault".to_string(),
            keyring_account: "store-key".to_string(),
        }
    }
}

fn default_bucket() -> String {
    "wallets".to_string()
}

fn default_mount() -> String {
    "secret".to_string()
}

/// Load config from the default path; if missing, return defaults.
pub fn load() -> Result<Config> {
    let path = default_path()?;
    load_from_path(path)
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("walletvault").join("config.toml"))
}

/// Write the given config to the default path unless a file is already there.
pub fn write_default_if_missing(config: &Config) -> Result<PathBuf> {
    write_if_missing(config, &default_path()?)
}

fn write_if_missing(config: &Config, path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(path, body)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_default_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_from_path(dir.path().join("config.toml")).expect("load");
        assert_eq!(cfg, Config::default());
        assert!(cfg.encryption.enabled);
    }

    #[test]
    fn parses_secret_service_config() {
        let contents = r#"
            prefix = "wallets"
            [backend]
            kind = "secret-service"
            address = "https://vault.internal:8200"
            token = "s.abc"
            [encryption]
            enabled = false
        "#;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("write temp config");

        let cfg = load_from_path(&path).expect("load");
        assert_eq!(
            cfg,
            Config {
                prefix: Some("wallets".into()),
                backend: BackendConfig::SecretService {
                    address: "https://vault.internal:8200".into(),
                    mount: "secret".into(),
                    token: Some("s.abc".into()),
                },
                encryption: EncryptionConfig {
                    enabled: false,
                    ..EncryptionConfig::default()
                },
            }
        );
    }

    #[test]
    fn parses_filesystem_config() {
        let contents = r#"
            [backend]
            kind = "filesystem"
            root = "/tmp/walletvault"
            bucket = "primary"
        "#;
        let cfg: Config = toml::from_str(contents).expect("parse");
        assert_eq!(
            cfg.backend,
            BackendConfig::Filesystem {
                root: Some(PathBuf::from("/tmp/walletvault")),
                bucket: "primary".into(),
            }
        );
        assert_eq!(cfg.prefix, None);
    }

    #[test]
    fn write_default_creates_file_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config {
            prefix: Some("vault".into()),
            ..Config::default()
        };

        write_if_missing(&cfg, &path).expect("write should succeed");
        let second = write_if_missing(&Config::default(), &path).expect("second write ok");
        assert_eq!(second, path);
        assert_eq!(load_from_path(&path).expect("load"), cfg);
    }
}
