//! Concrete backends and encryption for walletvault.
//! AES-GCM payload encryption with keys sourced from the OS keyring (or test doubles),
//! plus adapters for bucket-oriented object stores and hierarchical secret services.

pub mod cipher;
pub mod key_provider;
pub mod object_store;
pub mod secret_service;
