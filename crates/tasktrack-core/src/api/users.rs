//! User administration calls.

use serde::Serialize;
use serde_json::Value;

use super::client::ApiRequest;
use super::unwrap;
use super::{ApiClient, ApiError, LogFailure};

impl ApiClient {
    /// All users. Fails with `InvalidResponse` if the body has no `users`.
    pub async fn get_users(&self) -> Result<Value, ApiError> {
        self.call("users.list", ApiRequest::get("/users"), unwrap::USERS)
            .await
    }

    /// Create an account. Takes a [`crate::models::NewUser`] or any other
    /// serializable body.
    pub async fn register_user<B: Serialize + ?Sized>(&self, user: &B) -> Result<Value, ApiError> {
        let request = ApiRequest::post("/register")
            .json_from(user)
            .log_failure("users.register")?;
        self.call("users.register", request, unwrap::USER).await
    }

    pub async fn update_user_admin<B: Serialize + ?Sized>(
        &self,
        user_id: i64,
        update: &B,
    ) -> Result<Value, ApiError> {
        let request = ApiRequest::put(format!("/users/{}", user_id))
            .json_from(update)
            .log_failure("users.update")?;
        self.call("users.update", request, unwrap::USER).await
    }

    pub async fn delete_user_admin(&self, user_id: i64) -> Result<Value, ApiError> {
        let request = ApiRequest::delete(format!("/users/{}", user_id));
        self.call("users.delete", request, unwrap::BODY).await
    }
}
