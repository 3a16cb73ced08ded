//! Request payloads for the task-tracking API.
//!
//! Responses are handed back as `serde_json::Value` because the backend's
//! envelopes vary per endpoint; these types cover what the client sends.
//!
//! - `TaskInput`, `TaskQuery`: task creation/update bodies and list filters
//! - `NewUser`, `UserUpdate`: admin user management bodies

pub mod task;
pub mod user;

pub use task::{TaskInput, TaskQuery};
pub use user::{NewUser, UserUpdate};
