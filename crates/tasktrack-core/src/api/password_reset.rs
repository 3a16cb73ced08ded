//! Password reset workflow: self-service requests and their administration.

use serde_json::{json, Value};

use super::client::ApiRequest;
use super::unwrap;
use super::{ApiClient, ApiError};

/// Password reset call group, see [`ApiClient::password_reset`].
pub struct PasswordReset<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn password_reset(&self) -> PasswordReset<'_> {
        PasswordReset { client: self }
    }
}

impl PasswordReset<'_> {
    /// File a reset request for `email`. Sent without credentials.
    pub async fn request_reset(&self, email: &str) -> Result<Value, ApiError> {
        let request = ApiRequest::post("/password-reset/request")
            .unauthenticated()
            .json(json!({ "email": email }));
        self.client.call("password_reset.request_reset", request, unwrap::BODY).await
    }

    /// Set a new password using a reset token. Sent without credentials.
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<Value, ApiError> {
        let request = ApiRequest::post("/password-reset/reset")
            .unauthenticated()
            .json(json!({
                "token": token,
                "password": password,
                "password_confirmation": confirmation,
            }));
        self.client.call("password_reset.reset_password", request, unwrap::BODY).await
    }

    /// Pending reset requests, for administrators. Always a list.
    pub async fn get_reset_requests(&self) -> Result<Value, ApiError> {
        let request = ApiRequest::get("/password-reset/requests");
        self.client
            .call("password_reset.get_reset_requests", request, unwrap::RESET_REQUESTS)
            .await
    }

    pub async fn admin_reset_password(&self, user_id: i64, new_password: &str) -> Result<Value, ApiError> {
        let request = ApiRequest::post("/password-reset/admin-reset")
            .json(json!({ "user_id": user_id, "new_password": new_password }));
        self.client.call("password_reset.admin_reset_password", request, unwrap::BODY).await
    }

    pub async fn cancel_reset_request(&self, request_id: i64) -> Result<Value, ApiError> {
        let request = ApiRequest::delete(format!("/password-reset/requests/{}", request_id));
        self.client.call("password_reset.cancel_reset_request", request, unwrap::BODY).await
    }
}
