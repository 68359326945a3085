use tracing::{debug, instrument};
use uuid::Uuid;
use walletvault_core::{record::RecordHeader, storage::Backend, VaultError};

use crate::{
    enumerate::{self, Scope},
    Records, Store,
};

impl<B: Backend + 'static> Store<B> {
    /// Store wallet-level data, replacing whatever is stored for `id`.
    ///
    /// No name check is made; use [`Store::store_wallet_unique`] when another wallet with
    /// the same name must be refused.
    #[instrument(skip(self, data), fields(backend = self.backend.kind()))]
    pub async fn store_wallet(&self, id: Uuid, name: &str, data: &[u8]) -> Result<(), VaultError> {
        let path = self.paths.wallet_path(id);
        let stored = self.gate.encrypt_if_required(data)?;
        self.backend
            .put(&path, &stored)
            .await
            .map_err(|err| VaultError::from_backend("store wallet", err))?;
        debug!(%path, "stored wallet");
        Ok(())
    }

    /// Store wallet-level data, refusing a name already used by a different wallet.
    ///
    /// Runs under a process-wide wallet-name lock, so concurrent calls through clones of
    /// this store cannot both claim a name.
    #[instrument(skip(self, data), fields(backend = self.backend.kind()))]
    pub async fn store_wallet_unique(
        &self,
        id: Uuid,
        name: &str,
        data: &[u8],
    ) -> Result<(), VaultError> {
        let _guard = self.locks.acquire_names().await;
        let clash = self
            .find_wallet(|header| header.has_name(name) && !header.has_id(id))
            .await;
        if clash.is_some() {
            return Err(VaultError::WalletExists {
                name: name.to_string(),
            });
        }
        self.store_wallet(id, name, data).await
    }

    /// First wallet whose `name` matches.
    #[instrument(skip(self))]
    pub async fn retrieve_wallet(&self, name: &str) -> Result<Vec<u8>, VaultError> {
        self.find_wallet(|header| header.has_name(name))
            .await
            .ok_or_else(|| VaultError::not_found(format!("wallet {name}")))
    }

    /// First wallet whose `uuid` matches.
    #[instrument(skip(self))]
    pub async fn retrieve_wallet_by_id(&self, id: Uuid) -> Result<Vec<u8>, VaultError> {
        self.find_wallet(|header| header.has_id(id))
            .await
            .ok_or_else(|| VaultError::not_found(format!("wallet {id}")))
    }

    /// Every readable wallet record.
    pub fn retrieve_wallets(&self) -> Records {
        enumerate::spawn(
            self.backend.clone(),
            self.gate.clone(),
            Scope::Wallets {
                root: self.paths.wallets_root(),
            },
        )
    }

    async fn find_wallet(&self, predicate: impl Fn(&RecordHeader) -> bool) -> Option<Vec<u8>> {
        let mut wallets = self.retrieve_wallets();
        while let Some(data) = wallets.next().await {
            if RecordHeader::decode(&data).is_ok_and(|header| predicate(&header)) {
                return Some(data);
            }
        }
        None
    }
}
