//! Wallet and account persistence over any [`Backend`].
//!
//! [`Store`] layers the wallet/account rules (existence checks, name lookups, overwrite and
//! collision policy) and transparent encryption on top of a backend adapter. Listings are
//! produced lazily by a background task; see [`Records`].

mod account;
mod enumerate;
mod locks;
mod wallet;

use std::sync::Arc;

use walletvault_core::{crypto::EncryptionGate, paths::PathDeriver, storage::Backend};

pub use enumerate::{Records, BUFFER_CAPACITY};

use crate::locks::WalletLocks;

/// Wallet and account store backed by `B`.
pub struct Store<B: Backend> {
    backend: Arc<B>,
    paths: PathDeriver,
    gate: EncryptionGate,
    locks: Arc<WalletLocks>,
}

impl<B: Backend + 'static> Store<B> {
    pub fn new(backend: B, paths: PathDeriver, gate: EncryptionGate) -> Self {
        Self {
            backend: Arc::new(backend),
            paths,
            gate,
            locks: Arc::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn paths(&self) -> &PathDeriver {
        &self.paths
    }

    pub fn is_encrypted(&self) -> bool {
        self.gate.is_active()
    }
}

impl<B: Backend> Clone for Store<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            paths: self.paths.clone(),
            gate: self.gate.clone(),
            locks: Arc::clone(&self.locks),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use serde_json::json;
    use uuid::Uuid;

    pub(crate) const W1: &str = "11111111-1111-1111-1111-111111111111";

    pub(crate) fn id(raw: &str) -> Uuid {
        Uuid::parse_str(raw).expect("uuid")
    }

    pub(crate) fn record(uuid: Uuid, name: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({ "uuid": uuid.to_string(), "name": name, "version": 4 }))
            .expect("json")
    }
}
