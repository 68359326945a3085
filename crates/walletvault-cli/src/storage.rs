use std::{path::PathBuf, sync::Arc};

use color_eyre::{eyre::eyre, Result};
use dirs::data_dir;
use tracing::debug;
use walletvault_core::{crypto::EncryptionGate, paths::PathDeriver, storage::Backend};
use walletvault_storage::{
    cipher::AesGcmCipher,
    key_provider::{KeyProvider, KeyringProvider},
    object_store::{FsObjectStore, ObjectStoreBackend},
    secret_service::{HttpSecretClient, SecretServiceBackend, SecretServiceSettings},
};
use walletvault_store::Store;

use crate::config::{BackendConfig, Config};

const TOKEN_ENV: &str = "WALLETVAULT_TOKEN";

/// Store over whichever backend the config selects.
pub type DynStore = Store<Arc<dyn Backend>>;

/// Resolve the default data directory for walletvault.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| eyre!("no data dir available"))?;
    Ok(base.join("walletvault"))
}

/// Build the store described by `config`, with the key taken from the OS keychain.
pub async fn store_from_config(config: &Config) -> Result<DynStore> {
    let gate = if config.encryption.enabled {
        let provider = KeyringProvider::new(
            config.encryption.keyring_service.clone(),
            config.encryption.keyring_account.clone(),
        );
        gate_from_provider(&provider).await?
    } else {
        EncryptionGate::disabled()
    };
    Ok(Store::new(backend_from_config(config)?, paths(config), gate))
}

pub fn paths(config: &Config) -> PathDeriver {
    match &config.prefix {
        Some(prefix) => PathDeriver::with_prefix(prefix),
        None => PathDeriver::new(),
    }
}

pub fn backend_from_config(config: &Config) -> Result<Arc<dyn Backend>> {
    match &config.backend {
        BackendConfig::Filesystem { root, bucket } => {
            let root = match root {
                Some(root) => root.clone(),
                None => default_data_dir()?,
            };
            debug!(?root, %bucket, "using filesystem object store");
            Ok(Arc::new(ObjectStoreBackend::new(
                FsObjectStore::new(root),
                bucket.clone(),
            )))
        }
        BackendConfig::SecretService {
            address,
            mount,
            token,
        } => {
            let token = token
                .clone()
                .or_else(|| std::env::var(TOKEN_ENV).ok())
                .ok_or_else(|| {
                    eyre!("secret service token missing; set it in config or {TOKEN_ENV}")
                })?;
            debug!(%address, %mount, "using secret service");
            let client = HttpSecretClient::new(SecretServiceSettings {
                address: address.clone(),
                mount: mount.clone(),
                token,
            })
            .map_err(|e| eyre!(e.to_string()))?;
            Ok(Arc::new(SecretServiceBackend::new(client)))
        }
    }
}

pub async fn gate_from_provider<P: KeyProvider>(provider: &P) -> Result<EncryptionGate> {
    let key = provider
        .get_or_create()
        .await
        .map_err(|e| eyre!(e.to_string()))?;
    Ok(EncryptionGate::new(Arc::new(AesGcmCipher), Some(key), true))
}

/// Helper for tests to construct a store rooted at a temp dir with an in-memory key.
#[cfg(test)]
pub async fn test_store(root: impl Into<PathBuf>) -> DynStore {
    use walletvault_storage::key_provider::InMemoryKeyProvider;

    let gate = gate_from_provider(&InMemoryKeyProvider::default())
        .await
        .expect("in-memory key");
    let backend: Arc<dyn Backend> = Arc::new(ObjectStoreBackend::new(
        FsObjectStore::new(root),
        "wallets",
    ));
    Store::new(backend, PathDeriver::new(), gate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_service_without_token_is_an_error() {
        std::env::remove_var(TOKEN_ENV);
        let config = Config {
            backend: BackendConfig::SecretService {
                address: "http://127.0.0.1:8200".into(),
                mount: "secret".into(),
                token: None,
            },
            ..Config::default()
        };
        assert!(backend_from_config(&config).is_err());
    }

    #[test]
    fn backend_kind_follows_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let fs = Config {
            backend: BackendConfig::Filesystem {
                root: Some(dir.path().to_path_buf()),
                bucket: "wallets".into(),
            },
            ..Config::default()
        };
        assert_eq!(backend_from_config(&fs).expect("fs").kind(), "object-store");

        let secret = Config {
            backend: BackendConfig::SecretService {
                address: "http://127.0.0.1:8200".into(),
                mount: "secret".into(),
                token: Some("s.test".into()),
            },
            ..Config::default()
        };
        assert_eq!(
            backend_from_config(&secret).expect("secret").kind(),
            "secret-service"
        );
    }

    #[test]
    fn prefix_feeds_path_deriver() {
        let config = Config {
            prefix: Some("vault".into()),
            ..Config::default()
        };
        assert_eq!(paths(&config).wallets_root(), "vault/");
    }
}
