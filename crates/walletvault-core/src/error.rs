use thiserror::Error;
use uuid::Uuid;

use crate::{crypto::CipherError, storage::BackendError};

/// Errors surfaced by wallet and account store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VaultError {
    /// No record matches the requested identifier or name.
    #[error("{what} not found")]
    NotFound { what: String },
    /// An account operation referenced a wallet that does not exist.
    #[error("unknown wallet {wallet_id}")]
    UnknownWallet { wallet_id: Uuid },
    /// A different account already occupies the target path or name.
    #[error("account already exists in wallet {wallet_id}: {account}")]
    AccountExists { wallet_id: Uuid, account: String },
    /// A different wallet already carries the requested name.
    #[error("wallet already exists: {name}")]
    WalletExists { name: String },
    /// A stored record could not be decoded where its fields were required.
    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },
    /// Backend I/O failure, tagged with the operation that hit it.
    #[error("failed to {op}: {reason}")]
    Storage { op: &'static str, reason: String },
    #[error("encryption failed: {reason}")]
    Encryption { reason: String },
    #[error("decryption failed: {reason}")]
    Decryption { reason: String },
}

impl VaultError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Wrap a backend failure with operation context. Missing paths become `NotFound`.
    pub fn from_backend(op: &'static str, err: BackendError) -> Self {
        match err {
            BackendError::NotFound { path } => Self::NotFound { what: path },
            BackendError::Storage { reason } => Self::Storage { op, reason },
        }
    }

    pub(crate) fn encryption(err: CipherError) -> Self {
        Self::Encryption {
            reason: err.to_string(),
        }
    }

    pub(crate) fn decryption(err: CipherError) -> Self {
        Self::Decryption {
            reason: err.to_string(),
        }
    }
}
