//! API client for the task-tracking backend.
//!
//! `ApiClient` owns the shared HTTP client and the two cross-cutting hooks
//! every request goes through: bearer token injection on the way out, and
//! failure logging plus 401 handling on the way back. The resource call
//! groups (`tasks()`, `notifications()`, ...) are thin layers on top of
//! [`ApiClient::call`].

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::{header, multipart, Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::auth::SessionStore;
use crate::config::{Config, DEFAULT_TIMEOUT_MS};
use crate::location::{derive_origin, resolve_base_url};

use super::unwrap::{unwrap_body, Extract};
use super::{ApiError, LogFailure};

// ============================================================================
// Constants
// ============================================================================

/// Connection establishment timeout, applied even to unbounded uploads.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Buffered session events per subscriber before the oldest is dropped.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Request paths whose 401s never reset the session: these are polled in the
/// background and may fail quietly.
const BACKGROUND_PATHS: [&str; 2] = ["/notifications", "/history"];

/// Page path of the login screen.
const LOGIN_PAGE: &str = "/login";

/// Published when the backend rejects the stored token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The token was cleared after a 401 on `path`; the host should reset
    /// its UI state and return to the login screen.
    Invalidated { path: String },
}

/// Per-request timeout policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// The client's configured default.
    Default,
    After(Duration),
    /// No limit, for large uploads.
    Unbounded,
}

pub(crate) enum Payload {
    Empty,
    Json(Value),
    Multipart(multipart::Form),
}

/// One outgoing request, built by a call group and consumed by `send`.
pub(crate) struct ApiRequest {
    method: Method,
    path: String,
    query: Option<Value>,
    payload: Payload,
    timeout: Timeout,
    authenticated: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            payload: Payload::Empty,
            timeout: Timeout::Default,
            authenticated: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.payload = Payload::Json(body);
        self
    }

    pub fn json_from<B: Serialize + ?Sized>(self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(ApiError::Encode)?;
        Ok(self.json(value))
    }

    pub fn query_from<Q: Serialize + ?Sized>(mut self, query: &Q) -> Result<Self, ApiError> {
        let value = serde_json::to_value(query).map_err(ApiError::Encode)?;
        let is_empty = value.as_object().map(|o| o.is_empty()).unwrap_or(value.is_null());
        self.query = if is_empty { None } else { Some(value) };
        Ok(self)
    }

    pub fn multipart(mut self, form: multipart::Form) -> Self {
        self.payload = Payload::Multipart(form);
        self
    }

    pub fn timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = timeout;
        self
    }

    /// Do not attach the bearer token (login and password recovery).
    pub fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

/// API client for the task-tracking backend.
/// Clone is cheap - the HTTP client, session store and event channel are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    origin: String,
    timeout: Duration,
    session: Arc<dyn SessionStore>,
    current_path: Arc<RwLock<String>>,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    /// Create a client for the host location and settings in `config`.
    pub fn new(config: &Config, session: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let location = config.host_location();
        let base_url = resolve_base_url(&location, config.production_origin());
        let client = Self::with_base_url(&base_url, session)?.with_timeout(config.request_timeout());
        client.set_current_path(&location.path);
        Ok(client)
    }

    /// Create a client for an explicit base URL, e.g. a test server.
    pub fn with_base_url(base_url: &str, session: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            client,
            origin: derive_origin(&base_url),
            base_url,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            session,
            current_path: Arc::new(RwLock::new("/".to_string())),
            events,
        })
    }

    /// Replace the default request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `scheme://host[:port]` of the backend, for non-API links.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Absolute URL of a backend asset such as `/storage/attachments/a.pdf`.
    pub fn asset_url(&self, path: &str) -> String {
        format!("{}/{}", self.origin, path.trim_start_matches('/'))
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// True when a usable token is stored. Says nothing about its validity.
    pub fn has_token(&self) -> bool {
        self.session.usable_token().is_some()
    }

    /// Tell the client which page the host is showing.
    pub fn set_current_path(&self, path: &str) {
        let mut guard = self.current_path.write().unwrap_or_else(|p| p.into_inner());
        *guard = path.to_string();
    }

    pub fn current_path(&self) -> String {
        self.current_path.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Subscribe to session invalidation events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ===== Interceptors =====

    /// Attach the bearer token when a usable one is stored.
    fn attach_token(&self, builder: RequestBuilder) -> (RequestBuilder, bool) {
        match self.session.usable_token() {
            Some(token) => (builder.bearer_auth(token), true),
            None => (builder, false),
        }
    }

    /// Log a failed request and apply the 401 policy. Never alters the error.
    fn intercept_failure(&self, method: &Method, url: &str, path: &str, err: &ApiError) {
        match err.status() {
            Some(status) => warn!(
                method = %method,
                url = url,
                status = status.as_u16(),
                body = %ApiError::truncate_body(&err.body().to_string()),
                "API request failed"
            ),
            None => warn!(method = %method, url = url, error = %err, "API request failed without a response"),
        }

        if err.is_unauthorized() {
            self.handle_unauthorized(path);
        }
    }

    fn handle_unauthorized(&self, path: &str) {
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session token");
        }

        if is_background_path(path) {
            debug!(path = path, "Ignoring 401 from background endpoint");
            return;
        }
        if is_login_page(&self.current_path()) {
            debug!(path = path, "Ignoring 401 while on the login page");
            return;
        }

        info!(path = path, "Session invalidated by server");
        let event = SessionEvent::Invalidated {
            path: path.to_string(),
        };
        if self.events.send(event).is_err() {
            debug!("No subscribers for session events");
        }
    }

    // ===== Request execution =====

    /// Execute a request and return the parsed JSON body (`Null` when empty).
    pub(crate) async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let ApiRequest {
            method,
            path,
            query,
            payload,
            timeout,
            authenticated,
        } = request;
        let url = self.url(&path);

        let mut builder = self.client.request(method.clone(), &url);
        if let Some(ref query) = query {
            builder = builder.query(query);
        }
        builder = match timeout {
            Timeout::Default => builder.timeout(self.timeout),
            Timeout::After(duration) => builder.timeout(duration),
            Timeout::Unbounded => builder,
        };
        let mut with_token = false;
        if authenticated {
            (builder, with_token) = self.attach_token(builder);
        }
        builder = match payload {
            Payload::Empty => builder,
            Payload::Json(body) => builder.json(&body),
            Payload::Multipart(form) => builder.multipart(form),
        };

        debug!(method = %method, url = %url, with_token = with_token, "Sending request");

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = ApiError::Network(e);
                self.intercept_failure(&method, &url, &path, &err);
                return Err(err);
            }
        };

        let status = response.status();
        if status.is_success() {
            let text = response.text().await?;
            return parse_success_body(&url, &text);
        }

        let text = response.text().await.unwrap_or_default();
        let err = ApiError::Status {
            method: method.clone(),
            url: url.clone(),
            status,
            body: ApiError::parse_body(&text),
        };
        self.intercept_failure(&method, &url, &path, &err);
        Err(err)
    }

    /// The call template: send, unwrap per `chain`, log failures under `name`.
    pub(crate) async fn call(
        &self,
        name: &'static str,
        request: ApiRequest,
        chain: &[Extract],
    ) -> Result<Value, ApiError> {
        let result = match self.send(request).await {
            Ok(body) => unwrap_body(body, chain),
            Err(e) => Err(e),
        };
        result.log_failure(name)
    }
}

fn parse_success_body(url: &str, text: &str) -> Result<Value, ApiError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e)))
}

pub(crate) fn is_background_path(path: &str) -> bool {
    BACKGROUND_PATHS.iter().any(|p| path.contains(p))
}

pub(crate) fn is_login_page(page: &str) -> bool {
    let page = page.split(['?', '#']).next().unwrap_or_default();
    let page = page.trim_end_matches('/');
    page == LOGIN_PAGE || page.ends_with(LOGIN_PAGE)
}
