//! # Remote Data Gateway
//!
//! Authenticated REST calls to the backend.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Gateway Request Flow                             │
//! │                                                                         │
//! │  list(Products)                                                         │
//! │      │                                                                  │
//! │      ├── session.token()          read per call, never cached           │
//! │      ├── GET {base}/products      Authorization: Bearer <token>         │
//! │      │                            x-request-id: <uuid>                  │
//! │      ▼                                                                  │
//! │  ┌─────────────┐  2xx   ┌───────────────────┐                          │
//! │  │  response   │───────►│ { "data": [...] } │──► [...] (unwrapped)     │
//! │  └──────┬──────┘        │ [...]             │──► [...] (as is)         │
//! │         │               └───────────────────┘                          │
//! │         │ 401/403 ─────► ClientError::Unauthorized { message }          │
//! │         └ other ───────► ClientError::Api { status, message }           │
//! │                          message = body.message ?? body.error           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Payloads come back as raw JSON. Turning them into domain types is the
//! job of [`crate::normalize`], so that a malformed collection fails only its
//! own branch of a load cycle.

use std::time::Duration;

use async_trait::async_trait;
use gadget_core::Identity;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::normalize;
use crate::session::SessionHandle;

// =============================================================================
// Resources
// =============================================================================

/// The backend's resource collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Products,
    Transactions,
    Expenses,
    Users,
    Categories,
    Brands,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::Products,
        Resource::Transactions,
        Resource::Expenses,
        Resource::Users,
        Resource::Categories,
        Resource::Brands,
    ];

    /// Path relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Products => "products",
            Resource::Transactions => "transactions",
            Resource::Expenses => "expenses",
            Resource::Users => "users",
            Resource::Categories => "categories",
            Resource::Brands => "brands",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

// =============================================================================
// Backend Port
// =============================================================================

/// Everything the client needs from the backend.
///
/// [`HttpGateway`] is the real implementation; tests swap in an in-memory
/// one.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `POST /login`. Returns the identity with its token filled in.
    async fn login(&self, email: &str, password: &str) -> ClientResult<Identity>;

    /// `GET /{resource}`, envelope already unwrapped.
    async fn list(&self, resource: Resource) -> ClientResult<Value>;

    async fn create(&self, resource: Resource, body: Value) -> ClientResult<Value>;

    async fn update(&self, resource: Resource, id: &str, body: Value) -> ClientResult<Value>;

    async fn delete(&self, resource: Resource, id: &str) -> ClientResult<()>;
}

// =============================================================================
// HTTP Gateway
// =============================================================================

pub struct HttpGateway {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    session: SessionHandle,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig, session: SessionHandle) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(HttpGateway {
            client,
            base_url: config.base_url()?,
            timeout: config.timeout(),
            session,
        })
    }

    fn url(&self, resource: &str, id: Option<&str>) -> ClientResult<Url> {
        let mut url = self.base_url.join(resource)?;
        if let Some(id) = id {
            url.path_segments_mut()
                .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
                .push(id);
        }
        Ok(url)
    }

    /// Sends one request and returns the unwrapped JSON body.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        authenticated: bool,
    ) -> ClientResult<Value> {
        let request_id = Uuid::new_v4();
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header("x-request-id", request_id.to_string());

        if authenticated {
            let token = self.session.token().await.ok_or(ClientError::NotAuthenticated)?;
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        debug!(%method, path = url.path(), %request_id, "Sending request");

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = error_message(&text);
            warn!(%method, path = url.path(), status = status.as_u16(), %request_id, "Backend error");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ClientError::Unauthorized { message }
                }
                _ => ClientError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        let value: Value = serde_json::from_str(&text).map_err(|e| ClientError::InvalidPayload {
            resource: url.path().to_string(),
            reason: e.to_string(),
        })?;
        Ok(unwrap_envelope(value))
    }

    fn transport_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout.as_secs())
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl Backend for HttpGateway {
    async fn login(&self, email: &str, password: &str) -> ClientResult<Identity> {
        let url = self.url("login", None)?;
        let body = json!({ "email": email, "password": password });
        let value = self.send(Method::POST, url, Some(body), false).await?;

        let token = value
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::InvalidPayload {
                resource: "login".to_string(),
                reason: "missing token".to_string(),
            })?;
        let user = value.get("user").ok_or_else(|| ClientError::InvalidPayload {
            resource: "login".to_string(),
            reason: "missing user".to_string(),
        })?;

        Ok(Identity::from_user(normalize::user(user)?, token))
    }

    async fn list(&self, resource: Resource) -> ClientResult<Value> {
        let url = self.url(resource.path(), None)?;
        self.send(Method::GET, url, None, true).await
    }

    async fn create(&self, resource: Resource, body: Value) -> ClientResult<Value> {
        let url = self.url(resource.path(), None)?;
        self.send(Method::POST, url, Some(body), true).await
    }

    async fn update(&self, resource: Resource, id: &str, body: Value) -> ClientResult<Value> {
        let url = self.url(resource.path(), Some(id))?;
        self.send(Method::PUT, url, Some(body), true).await
    }

    async fn delete(&self, resource: Resource, id: &str) -> ClientResult<()> {
        let url = self.url(resource.path(), Some(id))?;
        self.send(Method::DELETE, url, None, true).await.map(|_| ())
    }
}

// =============================================================================
// Body Helpers
// =============================================================================

/// `{ "data": x }` → `x`. Anything else is returned unchanged.
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// The backend's `message` (or `error`) field from an error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|m| !m.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use crate::storage::MemoryStorage;
    use axum::extract::{Path, State};
    use axum::http::HeaderMap;
    use axum::routing::{get, post, put};
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Seen {
        tokens: Arc<Mutex<Vec<String>>>,
        deleted: Arc<Mutex<Vec<String>>>,
    }

    fn bearer(headers: &HeaderMap) -> Option<String> {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string)
    }

    async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["email"] == "admin@gadgetprima.com" && body["password"] == "admin123" {
            (
                StatusCode::OK,
                Json(json!({
                    "token": "tok-admin",
                    "user": { "id": 1, "name": "Admin", "email": "admin@gadgetprima.com", "role": "Admin" }
                })),
            )
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Email atau password salah" })),
            )
        }
    }

    async fn products(State(seen): State<Seen>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
        match bearer(&headers) {
            Some(token) => {
                seen.tokens.lock().unwrap().push(token);
                (
                    StatusCode::OK,
                    Json(json!({ "data": [{ "id": 1, "name": "iPhone 15", "sku": "IPH-15" }] })),
                )
            }
            None => (StatusCode::UNAUTHORIZED, Json(json!({ "message": "no token" }))),
        }
    }

    async fn create_product() -> (StatusCode, Json<Value>) {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "SKU already exists" })),
        )
    }

    async fn update_product(Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
        Json(json!({ "data": { "id": id, "name": body["name"] } }))
    }

    async fn delete_product(State(seen): State<Seen>, Path(id): Path<String>) -> StatusCode {
        seen.deleted.lock().unwrap().push(id);
        StatusCode::NO_CONTENT
    }

    async fn users() -> (StatusCode, Json<Value>) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "database unavailable" })),
        )
    }

    async fn brands() -> Json<Value> {
        Json(json!([{ "id": "b1", "name": "Apple" }]))
    }

    async fn spawn_backend(seen: Seen) -> String {
        let app = Router::new()
            .route("/api/login", post(login))
            .route("/api/products", get(products).post(create_product))
            .route("/api/products/{id}", put(update_product).delete(delete_product))
            .route("/api/users", get(users))
            .route("/api/brands", get(brands))
            .with_state(seen);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api", addr)
    }

    async fn gateway(seen: Seen) -> (HttpGateway, SessionHandle) {
        let mut config = ClientConfig::default();
        config.api.base_url = spawn_backend(seen).await;
        let session = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
        (HttpGateway::new(&config, session.clone()).unwrap(), session)
    }

    fn identity(token: &str) -> Identity {
        Identity {
            id: "1".into(),
            name: "Admin".into(),
            email: "admin@gadgetprima.com".into(),
            role: "admin".into(),
            token: token.into(),
        }
    }

    #[tokio::test]
    async fn test_login_success_and_failure() {
        let (gw, _) = gateway(Seen::default()).await;

        let identity = gw.login("admin@gadgetprima.com", "admin123").await.unwrap();
        assert_eq!(identity.token, "tok-admin");
        assert_eq!(identity.id, "1");
        assert_eq!(identity.role(), Some(gadget_core::Role::Admin));

        let err = gw.login("admin@gadgetprima.com", "wrong").await.unwrap_err();
        assert!(err.is_auth_error());
        assert_eq!(err.user_message(), "Email atau password salah");
    }

    #[tokio::test]
    async fn test_list_requires_session() {
        let (gw, _) = gateway(Seen::default()).await;
        let err = gw.list(Resource::Products).await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_list_unwraps_envelope_and_bare_arrays() {
        let (gw, session) = gateway(Seen::default()).await;
        session.establish(identity("tok-1")).await.unwrap();

        let products = gw.list(Resource::Products).await.unwrap();
        assert_eq!(products.as_array().unwrap().len(), 1);

        let brands = gw.list(Resource::Brands).await.unwrap();
        assert_eq!(brands[0]["name"], "Apple");
    }

    #[tokio::test]
    async fn test_token_is_read_per_call() {
        let seen = Seen::default();
        let (gw, session) = gateway(seen.clone()).await;

        session.establish(identity("first")).await.unwrap();
        gw.list(Resource::Products).await.unwrap();
        session.establish(identity("second")).await.unwrap();
        gw.list(Resource::Products).await.unwrap();

        assert_eq!(*seen.tokens.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_error_bodies_are_mapped() {
        let (gw, session) = gateway(Seen::default()).await;
        session.establish(identity("tok")).await.unwrap();

        let err = gw
            .create(Resource::Products, json!({ "name": "Dup" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 422, .. }));
        assert_eq!(err.user_message(), "SKU already exists");

        let err = gw.list(Resource::Users).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.backend_message(), Some("database unavailable"));
    }

    #[tokio::test]
    async fn test_update_and_delete_use_id_path() {
        let seen = Seen::default();
        let (gw, session) = gateway(seen.clone()).await;
        session.establish(identity("tok")).await.unwrap();

        let updated = gw
            .update(Resource::Products, "7", json!({ "name": "Renamed" }))
            .await
            .unwrap();
        assert_eq!(updated["id"], "7");
        assert_eq!(updated["name"], "Renamed");

        gw.delete(Resource::Products, "7").await.unwrap();
        assert_eq!(*seen.deleted.lock().unwrap(), vec!["7"]);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_retryable() {
        let mut config = ClientConfig::default();
        config.api.base_url = "http://127.0.0.1:1/api".into();
        let session = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
        let gw = HttpGateway::new(&config, session).unwrap();

        let err = gw.login("a@b.co", "x").await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.user_message(), crate::error::GENERIC_FAILURE);
    }

    #[test]
    fn test_unwrap_envelope() {
        assert_eq!(unwrap_envelope(json!({ "data": [1, 2] })), json!([1, 2]));
        assert_eq!(unwrap_envelope(json!([1])), json!([1]));
        assert_eq!(unwrap_envelope(json!({ "id": 1 })), json!({ "id": 1 }));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"message":"nope"}"#).as_deref(), Some("nope"));
        assert_eq!(error_message(r#"{"error":"bad"}"#).as_deref(), Some("bad"));
        assert_eq!(error_message(r#"{"message":"","error":"bad"}"#).as_deref(), Some("bad"));
        assert_eq!(error_message("<html>"), None);
    }
}
