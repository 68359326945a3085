use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::error::VaultError;

/// Key material used for encryption at rest.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    /// Identifier for logging/rotation (never log key bytes).
    pub id: String,
    /// 256-bit symmetric key.
    pub bytes: [u8; 32],
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("id", &self.id)
            .field("bytes", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct CipherError {
    pub reason: String,
}

impl CipherError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Symmetric cipher applied to record payloads.
pub trait Cipher: Send + Sync {
    fn encrypt(&self, plain: &[u8], key: &KeyMaterial) -> Result<Vec<u8>, CipherError>;
    fn decrypt(&self, stored: &[u8], key: &KeyMaterial) -> Result<Vec<u8>, CipherError>;
}

/// Applies the store's encryption policy to payloads on their way to and from the backend.
///
/// The policy is fixed at construction: payloads are encrypted only when the gate is
/// enabled *and* a key is configured, otherwise bytes pass through unchanged.
#[derive(Clone)]
pub struct EncryptionGate {
    enabled: bool,
    key: Option<KeyMaterial>,
    cipher: Option<Arc<dyn Cipher>>,
}

impl EncryptionGate {
    pub fn new(cipher: Arc<dyn Cipher>, key: Option<KeyMaterial>, enabled: bool) -> Self {
        Self {
            enabled,
            key,
            cipher: Some(cipher),
        }
    }

    /// Gate that never touches payloads.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            key: None,
            cipher: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }

    fn active(&self) -> Option<(&dyn Cipher, &KeyMaterial)> {
        if !self.enabled {
            return None;
        }
        Some((self.cipher.as_deref()?, self.key.as_ref()?))
    }

    pub fn encrypt_if_required(&self, plain: &[u8]) -> Result<Vec<u8>, VaultError> {
        match self.active() {
            Some((cipher, key)) => cipher.encrypt(plain, key).map_err(VaultError::encryption),
            None => Ok(plain.to_vec()),
        }
    }

    pub fn decrypt_if_required(&self, stored: &[u8]) -> Result<Vec<u8>, VaultError> {
        match self.active() {
            Some((cipher, key)) => cipher.decrypt(stored, key).map_err(VaultError::decryption),
            None => Ok(stored.to_vec()),
        }
    }
}

impl fmt::Debug for EncryptionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionGate")
            .field("enabled", &self.enabled)
            .field("key", &self.key.as_ref().map(|k| k.id.as_str()))
            .field("active", &self.is_active())
            .finish()
    }
}
