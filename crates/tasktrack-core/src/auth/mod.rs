//! Session token storage.
//!
//! This module provides:
//! - `SessionStore`: the get/set/clear abstraction the API client reads
//!   the bearer token through
//! - `MemorySessionStore`: in-process storage for tests and embedding hosts
//! - `FileSessionStore`: token persisted to `session.json` in the cache dir
//! - `KeyringSessionStore`: token kept in the OS keychain

pub mod credentials;
pub mod session;

use std::path::PathBuf;
use std::sync::Arc;

pub use credentials::KeyringSessionStore;
pub use session::{is_usable_token, FileSessionStore, MemorySessionStore, SessionRecord, SessionStore};

use crate::config::SessionBackend;

/// Build the store selected in configuration.
pub fn open_store(backend: SessionBackend, cache_dir: PathBuf) -> Arc<dyn SessionStore> {
    match backend {
        SessionBackend::File => Arc::new(FileSessionStore::new(cache_dir)),
        SessionBackend::Keyring => Arc::new(KeyringSessionStore::new()),
    }
}
