use tracing::{debug, instrument};
use uuid::Uuid;
use walletvault_core::{record::RecordHeader, storage::Backend, VaultError};

use crate::{
    enumerate::{self, Scope},
    Records, Store,
};

impl<B: Backend + 'static> Store<B> {
    /// Store an account under an existing wallet.
    ///
    /// An account already stored under the same id is overwritten. A record at the target
    /// path that carries a different `uuid` is refused with [`VaultError::AccountExists`].
    /// Name clashes with other account ids are not checked; see
    /// [`Store::store_account_unique`].
    #[instrument(skip(self, data), fields(backend = self.backend.kind()))]
    pub async fn store_account(
        &self,
        wallet_id: Uuid,
        account_id: Uuid,
        data: &[u8],
    ) -> Result<(), VaultError> {
        let _guard = self.locks.acquire(wallet_id).await;
        self.ensure_wallet(wallet_id).await?;
        self.write_account(wallet_id, account_id, data).await
    }

    /// Store an account, also refusing a `name` already used by another account id in the
    /// same wallet.
    #[instrument(skip(self, data), fields(backend = self.backend.kind()))]
    pub async fn store_account_unique(
        &self,
        wallet_id: Uuid,
        account_id: Uuid,
        data: &[u8],
    ) -> Result<(), VaultError> {
        let _guard = self.locks.acquire(wallet_id).await;
        self.ensure_wallet(wallet_id).await?;

        let header = RecordHeader::decode(data).map_err(|err| VaultError::InvalidRecord {
            reason: err.to_string(),
        })?;
        if let Some(name) = header.name() {
            let mut accounts = self.retrieve_accounts(wallet_id);
            while let Some(existing) = accounts.next().await {
                let Ok(other) = RecordHeader::decode(&existing) else {
                    continue;
                };
                if other.has_name(name) && !other.has_id(account_id) {
                    return Err(VaultError::AccountExists {
                        wallet_id,
                        account: name.to_string(),
                    });
                }
            }
        }

        self.write_account(wallet_id, account_id, data).await
    }

    /// Account data stored at the account's path.
    #[instrument(skip(self))]
    pub async fn retrieve_account(
        &self,
        wallet_id: Uuid,
        account_id: Uuid,
    ) -> Result<Vec<u8>, VaultError> {
        let path = self.paths.account_path(wallet_id, account_id);
        let stored = self.backend.get(&path).await.map_err(|err| {
            match VaultError::from_backend("retrieve account", err) {
                VaultError::NotFound { .. } => {
                    VaultError::not_found(format!("account {account_id} in wallet {wallet_id}"))
                }
                other => other,
            }
        })?;
        self.gate.decrypt_if_required(&stored)
    }

    /// Every readable account record of a wallet. The wallet's own header is never included.
    pub fn retrieve_accounts(&self, wallet_id: Uuid) -> Records {
        enumerate::spawn(
            self.backend.clone(),
            self.gate.clone(),
            Scope::Accounts {
                namespace: self.paths.wallet_namespace(wallet_id),
                wallet_id,
            },
        )
    }

    async fn ensure_wallet(&self, wallet_id: Uuid) -> Result<(), VaultError> {
        match self.retrieve_wallet_by_id(wallet_id).await {
            Ok(_) => Ok(()),
            Err(VaultError::NotFound { .. }) => Err(VaultError::UnknownWallet { wallet_id }),
            Err(err) => Err(err),
        }
    }

    /// Overwrite the account path unless it holds a record with a different `uuid`.
    /// Callers hold the wallet lock.
    async fn write_account(
        &self,
        wallet_id: Uuid,
        account_id: Uuid,
        data: &[u8],
    ) -> Result<(), VaultError> {
        match self.retrieve_account(wallet_id, account_id).await {
            Ok(existing) => {
                let header =
                    RecordHeader::decode(&existing).map_err(|err| VaultError::InvalidRecord {
                        reason: format!("existing account {account_id}: {err}"),
                    })?;
                if !header.has_id(account_id) {
                    return Err(VaultError::AccountExists {
                        wallet_id,
                        account: account_id.to_string(),
                    });
                }
            }
            Err(VaultError::NotFound { .. }) => {}
            Err(err) => return Err(err),
        }

        let path = self.paths.account_path(wallet_id, account_id);
        let stored = self.gate.encrypt_if_required(data)?;
        self.backend
            .put(&path, &stored)
            .await
            .map_err(|err| VaultError::from_backend("store account", err))?;
        debug!(%path, "stored account");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc};

    use walletvault_core::{crypto::EncryptionGate, paths::PathDeriver, storage::InMemoryBackend};

    use super::*;
    use crate::testing::{id, record, W1};

    async fn store_with_wallet() -> (Arc<InMemoryBackend>, Store<Arc<InMemoryBackend>>, Uuid) {
        let backend = Arc::new(InMemoryBackend::new());
        let store = Store::new(backend.clone(), PathDeriver::new(), EncryptionGate::disabled());
        let w1 = id(W1);
        store
            .store_wallet(w1, "primary", &record(w1, "primary"))
            .await
            .expect("store wallet");
        (backend, store, w1)
    }

    #[tokio::test]
    async fn last_write_wins_for_same_account_id() {
        let (_, store, w1) = store_with_wallet().await;
        let a1 = Uuid::new_v4();

        store.store_account(w1, a1, &record(a1, "first")).await.unwrap();
        store.store_account(w1, a1, &record(a1, "second")).await.unwrap();

        assert_eq!(store.retrieve_account(w1, a1).await.unwrap(), record(a1, "second"));
        assert_eq!(store.retrieve_accounts(w1).collect().await.len(), 1);
    }

    #[tokio::test]
    async fn foreign_uuid_at_target_path_is_rejected() {
        let (backend, store, w1) = store_with_wallet().await;
        let a1 = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        backend.insert_raw(store.paths().account_path(w1, a1), record(intruder, "other"));

        let err = store
            .store_account(w1, a1, &record(a1, "mine"))
            .await
            .expect_err("collision");
        assert!(matches!(err, VaultError::AccountExists { .. }));
        assert_eq!(store.retrieve_account(w1, a1).await.unwrap(), record(intruder, "other"));
    }

    #[tokio::test]
    async fn existing_record_with_non_string_name_is_overwritten_by_id() {
        let (backend, store, w1) = store_with_wallet().await;
        let a1 = Uuid::new_v4();
        let odd = format!(r#"{{"uuid":"{a1}","name":{{"label":"x"}}}}"#).into_bytes();
        backend.insert_raw(store.paths().account_path(w1, a1), odd);

        store
            .store_account(w1, a1, &record(a1, "second"))
            .await
            .expect("overwrite by id");
        assert_eq!(store.retrieve_account(w1, a1).await.unwrap(), record(a1, "second"));
    }

    #[tokio::test]
    async fn undecodable_existing_record_blocks_overwrite() {
        let (backend, store, w1) = store_with_wallet().await;
        let a1 = Uuid::new_v4();
        backend.insert_raw(store.paths().account_path(w1, a1), b"garbage".to_vec());

        let err = store
            .store_account(w1, a1, &record(a1, "mine"))
            .await
            .expect_err("invalid");
        assert!(matches!(err, VaultError::InvalidRecord { .. }));
    }

    #[tokio::test]
    async fn unknown_wallet_is_rejected() {
        let (backend, store, _) = store_with_wallet().await;
        let before = backend.len();

        let err = store
            .store_account(Uuid::new_v4(), Uuid::new_v4(), b"{}")
            .await
            .expect_err("unknown wallet");
        assert!(matches!(err, VaultError::UnknownWallet { .. }));
        assert_eq!(backend.len(), before);
    }

    #[tokio::test]
    async fn missing_account_is_not_found() {
        let (_, store, w1) = store_with_wallet().await;
        let err = store
            .retrieve_account(w1, Uuid::new_v4())
            .await
            .expect_err("missing");
        assert!(matches!(err, VaultError::NotFound { .. }));
    }

    #[tokio::test]
    async fn enumeration_skips_failed_items_only() {
        let (backend, store, w1) = store_with_wallet().await;
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        for a in &ids {
            store.store_account(w1, *a, &record(*a, &a.to_string())).await.unwrap();
        }
        let failing = ids[2];
        backend.fail_reads_for(store.paths().account_path(w1, failing));

        let listed: HashSet<Vec<u8>> =
            store.retrieve_accounts(w1).collect().await.into_iter().collect();
        let expected: HashSet<Vec<u8>> = ids
            .iter()
            .filter(|a| **a != failing)
            .map(|a| record(*a, &a.to_string()))
            .collect();
        assert_eq!(listed, expected);
    }

    #[tokio::test]
    async fn enumeration_ignores_markers_and_legacy_header() {
        let (backend, store, w1) = store_with_wallet().await;
        let a1 = Uuid::new_v4();
        store.store_account(w1, a1, &record(a1, "savings")).await.unwrap();
        backend.insert_raw(store.paths().wallet_namespace(w1), Vec::new());
        backend.insert_raw(store.paths().account_path(w1, w1), record(w1, "primary"));

        assert_eq!(
            store.retrieve_accounts(w1).collect().await,
            vec![record(a1, "savings")]
        );
    }

    #[tokio::test]
    async fn accounts_of_other_wallets_stay_separate() {
        let (_, store, w1) = store_with_wallet().await;
        let w2 = Uuid::new_v4();
        store.store_wallet(w2, "second", &record(w2, "second")).await.unwrap();
        let (a1, a2) = (Uuid::new_v4(), Uuid::new_v4());
        store.store_account(w1, a1, &record(a1, "one")).await.unwrap();
        store.store_account(w2, a2, &record(a2, "two")).await.unwrap();

        assert_eq!(store.retrieve_accounts(w1).collect().await, vec![record(a1, "one")]);
        assert_eq!(store.retrieve_accounts(w2).collect().await, vec![record(a2, "two")]);
        assert_eq!(store.retrieve_wallets().collect().await.len(), 2);
    }

    #[tokio::test]
    async fn plain_store_allows_duplicate_names_unique_store_refuses() {
        let (_, store, w1) = store_with_wallet().await;
        let (a1, a2, a3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        store.store_account(w1, a1, &record(a1, "savings")).await.unwrap();
        store.store_account(w1, a2, &record(a2, "savings")).await.unwrap();

        let err = store
            .store_account_unique(w1, a3, &record(a3, "savings"))
            .await
            .expect_err("name taken");
        assert!(matches!(err, VaultError::AccountExists { .. }));

        // Same id keeps its name on re-store.
        store
            .store_account_unique(w1, a1, &record(a1, "savings"))
            .await
            .expect("own name");
    }

    #[tokio::test]
    async fn concurrent_unique_accounts_admit_one_name() {
        let (_, store, w1) = store_with_wallet().await;
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let a = Uuid::new_v4();
                store.store_account_unique(w1, a, &record(a, "race")).await
            }));
        }

        let mut stored = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                stored += 1;
            }
        }
        assert_eq!(stored, 1);
        assert_eq!(store.retrieve_accounts(w1).collect().await.len(), 1);
    }

    #[tokio::test]
    async fn unique_store_rejects_payload_that_is_not_json() {
        let (_, store, w1) = store_with_wallet().await;
        let err = store
            .store_account_unique(w1, Uuid::new_v4(), b"\x00")
            .await
            .expect_err("invalid");
        assert!(matches!(err, VaultError::InvalidRecord { .. }));
    }
}
