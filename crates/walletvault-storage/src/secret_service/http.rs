use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Method, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use tracing::instrument;
use walletvault_core::storage::BackendError;

use super::{SecretClient, SecretData};

const TOKEN_HEADER: &str = "x-vault-token";

/// Connection settings for an HTTP secret service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretServiceSettings {
    /// Base address, e.g. `https://vault.internal:8200`.
    pub address: String,
    /// Secrets engine mount the wallets live under.
    pub mount: String,
    pub token: String,
}

/// Client for a KV (version 1) style secrets API over HTTP.
///
/// Secrets live at `{address}/v1/{mount}/{path}`; `PUT` writes, `GET` reads and the
/// `LIST` verb enumerates a directory.
pub struct HttpSecretClient {
    settings: SecretServiceSettings,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SecretResponse {
    data: SecretData,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    data: ListData,
}

#[derive(Debug, Deserialize)]
struct ListData {
    #[serde(default)]
    keys: Vec<Value>,
}

impl HttpSecretClient {
    pub fn new(settings: SecretServiceSettings) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("walletvault"));
        let mut token = HeaderValue::from_str(&settings.token)
            .map_err(|e| BackendError::storage(format!("invalid token: {e}")))?;
        token.set_sensitive(true);
        headers.insert(TOKEN_HEADER, token);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(BackendError::storage)?;
        Ok(Self { settings, client })
    }

    fn url(&self, path: &str) -> String {
        let base = self.settings.address.trim_end_matches('/');
        let mount = self.settings.mount.trim_matches('/');
        let path = path.trim_matches('/');
        if path.is_empty() {
            format!("{base}/v1/{mount}")
        } else {
            format!("{base}/v1/{mount}/{path}")
        }
    }
}

#[async_trait]
impl SecretClient for HttpSecretClient {
    #[instrument(skip_all, fields(mount = %self.settings.mount, path = %path))]
    async fn write(&self, path: &str, data: SecretData) -> Result<(), BackendError> {
        self.client
            .put(self.url(path))
            .json(&data)
            .send()
            .await
            .map_err(BackendError::storage)?
            .error_for_status()
            .map_err(BackendError::storage)?;
        Ok(())
    }

    #[instrument(skip_all, fields(mount = %self.settings.mount, path = %path))]
    async fn read(&self, path: &str) -> Result<Option<SecretData>, BackendError> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(BackendError::storage)?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(BackendError::storage)?;
        let secret: Option<SecretResponse> = decode_response(status, &body)?;
        Ok(secret.map(|secret| secret.data))
    }

    #[instrument(skip_all, fields(mount = %self.settings.mount, path = %path))]
    async fn list(&self, path: &str) -> Result<Option<Vec<String>>, BackendError> {
        let resp = self
            .client
            .request(list_method()?, self.url(path))
            .send()
            .await
            .map_err(BackendError::storage)?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(BackendError::storage)?;
        let listing: Option<ListResponse> = decode_response(status, &body)?;
        Ok(listing.map(ListResponse::names))
    }
}

impl ListResponse {
    /// Child names; non-string entries carry no usable name.
    fn names(self) -> Vec<String> {
        self.data
            .keys
            .into_iter()
            .filter_map(|key| match key {
                Value::String(name) => Some(name),
                _ => None,
            })
            .collect()
    }
}

fn list_method() -> Result<Method, BackendError> {
    Method::from_bytes(b"LIST").map_err(BackendError::storage)
}

/// Map a response to its JSON body. `404` means nothing exists at the path.
fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
) -> Result<Option<T>, BackendError> {
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(BackendError::storage(format!(
            "secret service returned {status}: {}",
            String::from_utf8_lossy(body).trim()
        )));
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| BackendError::storage(format!("unexpected response body: {e}")))
}
