use std::path::PathBuf;
use std::sync::RwLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Values that older frontends wrote into storage instead of removing the key.
const PLACEHOLDER_TOKENS: [&str; 2] = ["null", "undefined"];

/// Persistent home of the bearer token.
///
/// Implementations hold a single entry. `get` returns whatever is stored,
/// placeholders included; callers go through [`SessionStore::usable_token`]
/// when they need a token to send.
pub trait SessionStore: Send + Sync {
    fn get(&self) -> Option<String>;

    fn set(&self, token: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;

    /// The stored token, unless missing, empty or a placeholder string.
    fn usable_token(&self) -> Option<String> {
        self.get().filter(|token| is_usable_token(token))
    }
}

pub fn is_usable_token(token: &str) -> bool {
    let token = token.trim();
    !token.is_empty() && !PLACEHOLDER_TOKENS.contains(&token)
}

/// In-process store. Used by tests and by hosts that manage persistence
/// themselves.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn set(&self, token: &str) -> Result<()> {
        let mut guard = self.token.write().unwrap_or_else(|p| p.into_inner());
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self.token.write().unwrap_or_else(|p| p.into_inner());
        *guard = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    pub saved_at: DateTime<Utc>,
}

/// Token persisted as JSON in the cache directory.
pub struct FileSessionStore {
    cache_dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Load the full record, including when it was written.
    pub fn load(&self) -> Result<Option<SessionRecord>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .context("Failed to read session file")?;
        let record: SessionRecord = serde_json::from_str(&contents)
            .context("Failed to parse session file")?;
        Ok(Some(record))
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<String> {
        match self.load() {
            Ok(record) => record.map(|r| r.token),
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable session file");
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create session directory")?;
        }
        let record = SessionRecord {
            token: token.to_string(),
            saved_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&record)?;
        std::fs::write(path, contents).context("Failed to write session file")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_usable_token() {
        assert!(is_usable_token("abc"));
        assert!(!is_usable_token(""));
        assert!(!is_usable_token("   "));
        assert!(!is_usable_token("null"));
        assert!(!is_usable_token("undefined"));
    }

    #[test]
    fn test_memory_store_lifecycle() {
        let store = MemorySessionStore::new();
        assert_eq!(store.get(), None);

        store.set("abc").unwrap();
        assert_eq!(store.usable_token().as_deref(), Some("abc"));

        store.set("null").unwrap();
        assert_eq!(store.get().as_deref(), Some("null"));
        assert_eq!(store.usable_token(), None);

        store.clear().unwrap();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested"));
        assert_eq!(store.get(), None);

        store.set("tok-123").unwrap();
        assert_eq!(store.usable_token().as_deref(), Some("tok-123"));
        let record = store.load().unwrap().unwrap();
        assert!(record.saved_at <= Utc::now());

        store.clear().unwrap();
        assert_eq!(store.get(), None);
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_corrupt_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), "{not json").unwrap();
        let store = FileSessionStore::new(dir.path().to_path_buf());
        assert_eq!(store.get(), None);
        assert!(store.load().is_err());
    }
}
