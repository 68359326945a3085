//! Hierarchical secret-management services.
//!
//! Secret services expose directories: listing a path returns only the names of its
//! immediate children (sub-directories carry a trailing `/`), and every listed secret
//! needs a second read to obtain its content.

mod http;
mod memory;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tracing::instrument;
use walletvault_core::storage::{Backend, BackendError};

pub use http::{HttpSecretClient, SecretServiceSettings};
pub use memory::InMemorySecretClient;

/// Key/value body of one secret.
pub type SecretData = serde_json::Map<String, Value>;

/// Field under which payload bytes are written. Only secrets holding exactly this field are
/// decoded as payloads; any other secret reads back as its JSON document.
const PAYLOAD_FIELD: &str = "walletvault-payload";

/// Protocol spoken by a secret-management service.
#[async_trait]
pub trait SecretClient: Send + Sync {
    /// Write a secret, replacing any existing secret at `path`.
    async fn write(&self, path: &str, data: SecretData) -> Result<(), BackendError>;

    /// Read a secret; `None` when nothing exists at `path`.
    async fn read(&self, path: &str) -> Result<Option<SecretData>, BackendError>;

    /// Names directly below the directory `path`; `None` when the directory is empty or absent.
    async fn list(&self, path: &str) -> Result<Option<Vec<String>>, BackendError>;
}

/// Adapts a [`SecretClient`] to the uniform [`Backend`] contract.
///
/// Payloads are written base64-encoded under a single `walletvault-payload` field. Secrets that were
/// written by other tools as plain JSON documents are read back as that JSON.
pub struct SecretServiceBackend<C: SecretClient> {
    client: C,
}

impl<C: SecretClient> SecretServiceBackend<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

#[async_trait]
impl<C: SecretClient> Backend for SecretServiceBackend<C> {
    fn kind(&self) -> &'static str {
        "secret-service"
    }

    #[instrument(skip_all, fields(path = %path))]
    async fn put(&self, path: &str, value: &[u8]) -> Result<(), BackendError> {
        let mut data = SecretData::new();
        data.insert(PAYLOAD_FIELD.to_string(), Value::String(STANDARD.encode(value)));
        self.client.write(path, data).await
    }

    #[instrument(skip_all, fields(path = %path))]
    async fn get(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        let data = self
            .client
            .read(path)
            .await?
            .ok_or_else(|| BackendError::NotFound {
                path: path.to_string(),
            })?;
        decode_secret(data)
    }

    #[instrument(skip_all, fields(prefix = %prefix))]
    async fn list(&self, prefix: &str) -> Result<Vec<String>, BackendError> {
        // Only whole directories can be listed; a partial last segment filters the result.
        let dir = match prefix.rfind('/') {
            Some(idx) => &prefix[..=idx],
            None => "",
        };
        let names = self
            .client
            .list(dir.trim_end_matches('/'))
            .await?
            .unwrap_or_default();

        Ok(names
            .into_iter()
            .map(|name| format!("{dir}{name}"))
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}

fn decode_secret(data: SecretData) -> Result<Vec<u8>, BackendError> {
    if data.len() == 1 {
        if let Some(Value::String(encoded)) = data.get(PAYLOAD_FIELD) {
            return STANDARD
                .decode(encoded)
                .map_err(|e| BackendError::storage(format!("secret payload decode failed: {e}")));
        }
    }
    serde_json::to_vec(&data).map_err(BackendError::storage)
}
