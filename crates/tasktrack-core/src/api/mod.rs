//! REST API client module for the task-tracking backend.
//!
//! This module provides the `ApiClient` plus the resource call groups built
//! on it. Every call issues exactly one request, unwraps a specific part of
//! the JSON response, and on failure logs a diagnostic before returning the
//! original error unchanged.
//!
//! Authentication uses a bearer token kept in a [`crate::auth::SessionStore`].

pub mod auth;
pub mod client;
pub mod error;
pub mod notifications;
pub mod password_reset;
pub mod progress;
pub mod tasks;
pub mod unwrap;
pub mod users;

pub use client::{ApiClient, SessionEvent, Timeout};
pub use error::ApiError;
pub use notifications::Notifications;
pub use password_reset::PasswordReset;
pub use progress::{upload_percent, ProgressFn};
pub use tasks::{Attachment, Tasks};

use tracing::error;

/// Log a failed call under its name and hand the result back untouched.
pub(crate) trait LogFailure {
    fn log_failure(self, call: &'static str) -> Self;
}

impl<T> LogFailure for Result<T, ApiError> {
    fn log_failure(self, call: &'static str) -> Self {
        if let Err(ref e) = self {
            error!(
                call = call,
                status = e.status().map(|s| s.as_u16()),
                message = %e.server_message(),
                "API call failed"
            );
        }
        self
    }
}
