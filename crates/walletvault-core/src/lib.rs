//! Core abstractions for walletvault: path derivation, the backend contract,
//! the encryption gate and the shared error taxonomy.
//! This crate is intentionally small; concrete backends and ciphers live elsewhere.

pub mod crypto;
pub mod error;
pub mod paths;
pub mod record;
pub mod storage;

pub use error::VaultError;
