use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use walletvault_core::crypto::{Cipher, CipherError, KeyMaterial};

/// AES-256-GCM with a random nonce per payload.
///
/// Ciphertext is stored as a small JSON envelope so the nonce travels with the data.
#[derive(Debug, Default, Clone, Copy)]
pub struct AesGcmCipher;

#[derive(Debug, Serialize, Deserialize)]
struct StoredBlob {
    nonce: String,
    ciphertext: String,
}

impl Cipher for AesGcmCipher {
    fn encrypt(&self, plain: &[u8], key: &KeyMaterial) -> Result<Vec<u8>, CipherError> {
        let cipher = build_cipher(key)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plain)
            .map_err(|e| CipherError::new(format!("encrypt failed: {e}")))?;

        let blob = StoredBlob {
            nonce: URL_SAFE_NO_PAD.encode(nonce.as_slice()),
            ciphertext: URL_SAFE_NO_PAD.encode(ciphertext),
        };
        serde_json::to_vec(&blob).map_err(|e| CipherError::new(format!("envelope: {e}")))
    }

    fn decrypt(&self, stored: &[u8], key: &KeyMaterial) -> Result<Vec<u8>, CipherError> {
        let blob: StoredBlob = serde_json::from_slice(stored)
            .map_err(|e| CipherError::new(format!("envelope: {e}")))?;
        let cipher = build_cipher(key)?;

        let nonce_bytes = URL_SAFE_NO_PAD
            .decode(blob.nonce)
            .map_err(|e| CipherError::new(format!("nonce decode failed: {e}")))?;
        if nonce_bytes.len() != 12 {
            return Err(CipherError::new(format!(
                "nonce must be 12 bytes, got {}",
                nonce_bytes.len()
            )));
        }
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = URL_SAFE_NO_PAD
            .decode(blob.ciphertext)
            .map_err(|e| CipherError::new(format!("ciphertext decode failed: {e}")))?;

        cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|e| CipherError::new(format!("decrypt failed: {e}")))
    }
}

fn build_cipher(material: &KeyMaterial) -> Result<Aes256Gcm, CipherError> {
    Aes256Gcm::new_from_slice(&material.bytes)
        .map_err(|e| CipherError::new(format!("cipher init failed: {e}")))
}
