//! Session calls: login, session restore, logout and the signed-in user's
//! own account operations.

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::auth::is_usable_token;

use super::client::ApiRequest;
use super::unwrap::{self, unwrap_body};
use super::{ApiClient, ApiError, LogFailure};

impl ApiClient {
    /// Sign in and return the current user.
    ///
    /// The access token from the response is persisted before the user is
    /// fetched. If that follow-up fetch fails the user embedded in the login
    /// response (or the whole response) is returned instead. A response
    /// without a token is returned as is and nothing is stored.
    pub async fn login(&self, email: &str, password: &str) -> Result<Value, ApiError> {
        let request = ApiRequest::post("/login")
            .unauthenticated()
            .json(json!({ "email": email, "password": password }));
        let body = self.call("auth.login", request, unwrap::BODY).await?;

        let token = body
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|t| is_usable_token(t))
            .map(str::to_string);
        let Some(token) = token else {
            warn!("Login response carried no access token");
            return Ok(body);
        };

        self.session()
            .set(&token)
            .map_err(ApiError::Session)
            .log_failure("auth.login")?;
        info!("Logged in, token stored");

        match self.get_user().await {
            Ok(user) => Ok(user),
            Err(e) => {
                warn!(error = %e, "Could not fetch user after login, using login response");
                unwrap_body(body, unwrap::USER)
            }
        }
    }

    /// Check a stored token against the backend.
    ///
    /// Returns `false` without a request when no usable token is stored, and
    /// `false` with the token cleared when the backend answers 401 or 404.
    /// Other failures are returned as errors.
    pub async fn restore(&self) -> Result<bool, ApiError> {
        if !self.has_token() {
            debug!("No stored token to restore");
            return Ok(false);
        }

        match self.send(ApiRequest::get("/user")).await {
            Ok(_) => {
                info!("Restored session from stored token");
                Ok(true)
            }
            Err(e) if e.is_unauthorized() || e.is_not_found() => {
                if let Err(clear_err) = self.session().clear() {
                    warn!(error = %clear_err, "Failed to clear rejected token");
                }
                info!(status = ?e.status(), "Stored token rejected, signed out");
                Ok(false)
            }
            Err(e) => Err(e).log_failure("auth.restore"),
        }
    }

    /// Sign out. The stored token is cleared even if the request fails; the
    /// request error, if any, is returned afterwards.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = if self.has_token() {
            self.call("auth.logout", ApiRequest::post("/logout"), unwrap::BODY)
                .await
                .map(|_| ())
        } else {
            Ok(())
        };

        self.session()
            .clear()
            .map_err(ApiError::Session)
            .log_failure("auth.logout")?;
        info!("Logged out");
        result
    }

    pub async fn get_user(&self) -> Result<Value, ApiError> {
        self.call("auth.get_user", ApiRequest::get("/user"), unwrap::USER)
            .await
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        confirmation: &str,
    ) -> Result<Value, ApiError> {
        let request = ApiRequest::post("/change-password").json(json!({
            "current_password": current_password,
            "new_password": new_password,
            "new_password_confirmation": confirmation,
        }));
        self.call("auth.change_password", request, unwrap::BODY).await
    }

    /// Ask the backend to email a password reset link.
    pub async fn forgot_password(&self, email: &str) -> Result<Value, ApiError> {
        let request = ApiRequest::post("/forgot-password")
            .unauthenticated()
            .json(json!({ "email": email }));
        self.call("auth.forgot_password", request, unwrap::BODY).await
    }

    /// Complete a reset started with [`ApiClient::forgot_password`].
    pub async fn reset_password(
        &self,
        token: &str,
        email: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<Value, ApiError> {
        let request = ApiRequest::post("/reset-password")
            .unauthenticated()
            .json(json!({
                "token": token,
                "email": email,
                "password": password,
                "password_confirmation": confirmation,
            }));
        self.call("auth.reset_password", request, unwrap::BODY).await
    }
}
