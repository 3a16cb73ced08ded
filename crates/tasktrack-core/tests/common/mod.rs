//! Shared setup for the HTTP-level tests.
#![allow(dead_code)]

use std::sync::Arc;

use mockito::ServerGuard;
use tasktrack_core::{ApiClient, MemorySessionStore, SessionStore};

pub const JSON: &str = "application/json";

/// A client pointed at `server`, with `token` pre-stored when given.
pub fn client_for(server: &ServerGuard, token: Option<&str>) -> (ApiClient, Arc<MemorySessionStore>) {
    let store = Arc::new(match token {
        Some(token) => MemorySessionStore::with_token(token),
        None => MemorySessionStore::new(),
    });
    let client = ApiClient::with_base_url(&server.url(), store.clone() as Arc<dyn SessionStore>)
        .expect("client builds");
    (client, store)
}
