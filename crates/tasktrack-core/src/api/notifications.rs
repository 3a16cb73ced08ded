//! Notification calls.
//!
//! These endpoints are polled in the background, so a 401 from them clears
//! the token without publishing a session event.

use serde_json::Value;

use super::client::ApiRequest;
use super::unwrap;
use super::{ApiClient, ApiError};

/// Notification call group, see [`ApiClient::notifications`].
pub struct Notifications<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn notifications(&self) -> Notifications<'_> {
        Notifications { client: self }
    }
}

impl Notifications<'_> {
    /// Notifications of the current user. Always a list.
    pub async fn list(&self) -> Result<Value, ApiError> {
        self.client
            .call("notifications.list", ApiRequest::get("/notifications"), unwrap::NOTIFICATIONS)
            .await
    }

    pub async fn mark_as_read(&self, notification_id: i64) -> Result<Value, ApiError> {
        let request = ApiRequest::post(format!("/notifications/{}/read", notification_id));
        self.client.call("notifications.mark_as_read", request, unwrap::BODY).await
    }

    pub async fn mark_all_as_read(&self) -> Result<Value, ApiError> {
        let request = ApiRequest::post("/notifications/read-all");
        self.client.call("notifications.mark_all_as_read", request, unwrap::BODY).await
    }

    pub async fn delete(&self, notification_id: i64) -> Result<Value, ApiError> {
        let request = ApiRequest::delete(format!("/notifications/{}", notification_id));
        self.client.call("notifications.delete", request, unwrap::BODY).await
    }

    pub async fn delete_all(&self) -> Result<Value, ApiError> {
        let request = ApiRequest::delete("/notifications");
        self.client.call("notifications.delete_all", request, unwrap::BODY).await
    }

    /// Have the backend purge old, already-read notifications.
    pub async fn cleanup(&self) -> Result<Value, ApiError> {
        let request = ApiRequest::post("/notifications/cleanup");
        self.client.call("notifications.cleanup", request, unwrap::BODY).await
    }
}
