use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use walletvault_core::crypto::KeyMaterial;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("keyring error: {0}")]
    Keyring(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("generation error: {0}")]
    Generation(String),
}

/// Provides the store's encryption key (OS keychain in production; memory in tests).
#[async_trait]
pub trait KeyProvider: Send + Sync {
    async fn get_or_create(&self) -> Result<KeyMaterial, KeyError>;
}

/// OS keyring-backed provider. The key is generated on first use and kept as base64.
pub struct KeyringProvider {
    service: String,
    account: String,
}

impl KeyringProvider {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }
}

#[async_trait]
impl KeyProvider for KeyringProvider {
    async fn get_or_create(&self) -> Result<KeyMaterial, KeyError> {
        // Keyring operations are synchronous; wrap in async for trait compatibility.
        let entry = keyring::Entry::new(&self.service, &self.account)
            .map_err(|e| KeyError::Keyring(e.to_string()))?;

        if let Ok(secret) = entry.get_password() {
            return decode_key(&self.account, &secret);
        }

        let material = generate_key(&self.account);
        entry
            .set_password(&encode_key(&material))
            .map_err(|e| KeyError::Keyring(e.to_string()))?;
        tracing::info!(key_id = %material.id, "generated new store key");
        Ok(material)
    }
}

/// In-memory key provider for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKeyProvider {
    inner: Arc<Mutex<Option<KeyMaterial>>>,
}

#[async_trait]
impl KeyProvider for InMemoryKeyProvider {
    async fn get_or_create(&self) -> Result<KeyMaterial, KeyError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|err| KeyError::Generation(format!("lock poisoned: {err}")))?;

        if let Some(existing) = guard.clone() {
            return Ok(existing);
        }

        let material = generate_key("memory");
        *guard = Some(material.clone());
        Ok(material)
    }
}

pub fn generate_key(id: &str) -> KeyMaterial {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    KeyMaterial {
        id: id.to_string(),
        bytes,
    }
}

fn encode_key(material: &KeyMaterial) -> String {
    general_purpose::STANDARD.encode(material.bytes)
}

fn decode_key(id: &str, secret: &str) -> Result<KeyMaterial, KeyError> {
    let bytes = general_purpose::STANDARD
        .decode(secret.trim())
        .map_err(|e| KeyError::Decode(e.to_string()))?;

    let bytes: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| KeyError::Decode(format!("expected 32 bytes, got {}", bytes.len())))?;

    Ok(KeyMaterial {
        id: id.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_provider_returns_same_key() {
        let provider = InMemoryKeyProvider::default();
        let first = provider.get_or_create().await.unwrap();
        let second = provider.get_or_create().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.id, "memory");
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let err = decode_key("k", "abcd").expect_err("should reject wrong length");
        assert!(matches!(err, KeyError::Decode(_)));
    }

    #[test]
    fn encoded_key_decodes_back() {
        let material = generate_key("store");
        let decoded = decode_key("store", &encode_key(&material)).expect("decode");
        assert_eq!(decoded, material);
    }
}
