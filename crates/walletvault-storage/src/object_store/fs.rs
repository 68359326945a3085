use std::{
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use tempfile::NamedTempFile;
use tracing::instrument;
use walletvault_core::storage::BackendError;

use super::{ObjectPage, ObjectStoreClient};

const DEFAULT_PAGE_SIZE: usize = 1000;

/// Object store kept on the local filesystem.
///
/// Each bucket is a directory under `root`; each object is one file whose name is the
/// URL-safe base64 of its key, so keys with separators stay flat like in a real bucket.
/// Writes go through a temp file and an atomic rename.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
    page_size: usize,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, BackendError> {
        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket.starts_with('.') {
            return Err(BackendError::storage(format!("invalid bucket name: {bucket}")));
        }
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, BackendError> {
        Ok(self.bucket_dir(bucket)?.join(URL_SAFE_NO_PAD.encode(key)))
    }

    fn sorted_keys(&self, dir: &Path, prefix: &str) -> Result<Vec<String>, BackendError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(storage_err(err)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(storage_err)?;
            if !entry.file_type().map_err(storage_err)?.is_file() {
                continue;
            }
            // Temp files from in-flight writes never decode as a key.
            let Some(key) = entry
                .file_name()
                .to_str()
                .and_then(|name| URL_SAFE_NO_PAD.decode(name).ok())
                .and_then(|raw| String::from_utf8(raw).ok())
            else {
                continue;
            };
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl ObjectStoreClient for FsObjectStore {
    #[instrument(skip_all, fields(bucket = %bucket, key = %key))]
    async fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), BackendError> {
        let path = self.object_path(bucket, key)?;
        write_atomic(&path, body)
    }

    #[instrument(skip_all, fields(bucket = %bucket, key = %key))]
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        let path = self.object_path(bucket, key)?;
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(storage_err(err)),
        };

        let mut buf = Vec::new();
        file.read_to_end(&mut buf).map_err(storage_err)?;
        Ok(Some(buf))
    }

    #[instrument(skip_all, fields(bucket = %bucket, prefix = %prefix))]
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ObjectPage, BackendError> {
        let keys = self.sorted_keys(&self.bucket_dir(bucket)?, prefix)?;
        let start = match &continuation {
            Some(after) => keys.partition_point(|key| key <= after),
            None => 0,
        };
        let page: Vec<String> = keys.into_iter().skip(start).take(self.page_size + 1).collect();

        if page.len() > self.page_size {
            let mut page = page;
            page.truncate(self.page_size);
            let next = page.last().cloned();
            return Ok(ObjectPage { keys: page, next });
        }
        Ok(ObjectPage {
            keys: page,
            next: None,
        })
    }
}

fn write_atomic(path: &Path, body: &[u8]) -> Result<(), BackendError> {
    let parent = path
        .parent()
        .ok_or_else(|| BackendError::storage("invalid object path"))?;
    fs::create_dir_all(parent).map_err(storage_err)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(storage_err)?;
    tmp.write_all(body).map_err(storage_err)?;
    tmp.flush().map_err(storage_err)?;
    tmp.persist(path).map_err(|e| storage_err(e.error))?;
    Ok(())
}

fn storage_err<E: ToString>(err: E) -> BackendError {
    BackendError::storage(err)
}

#[cfg(test)]
mod tests {
    use walletvault_core::storage::Backend;

    use super::*;
    use crate::object_store::ObjectStoreBackend;

    #[tokio::test]
    async fn objects_round_trip_and_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsObjectStore::new(dir.path());

        store.put_object("b", "w/a", b"one").await.expect("put");
        store.put_object("b", "w/a", b"two").await.expect("put again");

        assert_eq!(
            store.get_object("b", "w/a").await.expect("get"),
            Some(b"two".to_vec())
        );
        assert_eq!(store.get_object("b", "w/missing").await.expect("get"), None);
    }

    #[tokio::test]
    async fn wallet_header_and_accounts_coexist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsObjectStore::new(dir.path());

        store.put_object("b", "w", b"header").await.expect("put");
        store.put_object("b", "w/a", b"account").await.expect("put");

        assert_eq!(store.get_object("b", "w").await.unwrap(), Some(b"header".to_vec()));
        assert_eq!(
            store.get_object("b", "w/a").await.unwrap(),
            Some(b"account".to_vec())
        );
    }

    #[tokio::test]
    async fn listing_pages_through_sorted_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsObjectStore::new(dir.path()).with_page_size(2);
        for key in ["w/c", "w/a", "w/", "w/b", "x/a"] {
            store.put_object("b", key, b"").await.expect("put");
        }

        let first = store.list_objects("b", "w/", None).await.expect("page");
        assert_eq!(first.keys, vec!["w/", "w/a"]);
        let second = store.list_objects("b", "w/", first.next).await.expect("page");
        assert_eq!(second.keys, vec!["w/b", "w/c"]);
        assert_eq!(second.next, None);

        let backend = ObjectStoreBackend::new(store, "b");
        assert_eq!(backend.list("w/").await.expect("list").len(), 4);
    }

    #[tokio::test]
    async fn missing_bucket_lists_empty_and_bad_bucket_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsObjectStore::new(dir.path());

        let page = store.list_objects("absent", "", None).await.expect("list");
        assert!(page.keys.is_empty());
        assert!(store.put_object("../escape", "k", b"v").await.is_err());
    }
}
