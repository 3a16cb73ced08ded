//! Client library for the tasktrack task-tracking backend.
//!
//! - `location`: picks the API base URL from where the host app runs
//! - `config`: on-disk configuration with environment overrides
//! - `auth`: bearer token storage behind the `SessionStore` trait
//! - `api`: the shared `ApiClient`, its auth hooks and the resource call groups
//! - `models`: typed request payloads
//!
//! ```no_run
//! use std::sync::Arc;
//! use tasktrack_core::{ApiClient, Config, MemorySessionStore, TaskQuery};
//!
//! # async fn run() -> Result<(), tasktrack_core::ApiError> {
//! let client = ApiClient::new(&Config::default(), Arc::new(MemorySessionStore::new()))?;
//! client.login("ada@example.com", "secret").await?;
//! let tasks = client.tasks().list(&TaskQuery::default()).await?;
//! println!("{}", tasks);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod location;
pub mod models;

pub use api::{ApiClient, ApiError, Attachment, ProgressFn, SessionEvent, Timeout};
pub use auth::{FileSessionStore, KeyringSessionStore, MemorySessionStore, SessionStore};
pub use config::{Config, SessionBackend};
pub use location::{derive_origin, resolve_base_url, HostLocation};
pub use models::{NewUser, TaskInput, TaskQuery, UserUpdate};
