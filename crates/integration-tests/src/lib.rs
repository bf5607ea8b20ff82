//! Test harness for Vitrine integration tests.
//!
//! [`FakeCommerce`] serves the slice of the commerce REST API the admin
//! library talks to, on an ephemeral localhost port. Every request is
//! recorded so tests can assert on what was sent, and [`Behavior`] switches
//! on the failures a test needs.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let server = vitrine_integration_tests::FakeCommerce::start().await?;
//! let client = vitrine_admin::CommerceClient::new(&server.api_config()?)?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, Method, StatusCode, header::AUTHORIZATION};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use vitrine_admin::config::{ApiConfig, ConfigError};

/// Password accepted by `POST /auth/login`.
pub const PASSWORD: &str = "correct horse battery staple";

/// `exp` of issued tokens: 2030-01-01T00:00:00Z.
pub const TOKEN_EXPIRY: i64 = 1_893_456_000;

/// CEP known to the address lookup.
pub const KNOWN_CEP: &str = "29100000";

/// A request as the fake server received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    /// JSON body, or `Null` when there was none.
    pub body: Value,
}

/// Switches for failure scenarios.
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    /// `POST /orders` answers 502.
    pub fail_orders: bool,
    /// Every authenticated route answers 401.
    pub revoke_tokens: bool,
    /// Quotes returned by the shipping endpoint.
    pub quotes: Vec<Value>,
    /// Values the uniqueness check reports as taken.
    pub taken: Vec<String>,
}

#[derive(Debug, Default)]
struct Inner {
    requests: Vec<RecordedRequest>,
    behavior: Behavior,
    next_id: u32,
}

type Shared = Arc<Mutex<Inner>>;

/// In-process commerce API.
#[derive(Debug, Clone)]
pub struct FakeCommerce {
    base_url: String,
    state: Shared,
}

impl FakeCommerce {
    /// Bind to `127.0.0.1:0` and serve in the background.
    ///
    /// # Errors
    ///
    /// Returns error if the listener cannot bind.
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(Behavior::default()).await
    }

    /// Start with the given behavior.
    ///
    /// # Errors
    ///
    /// Returns error if the listener cannot bind.
    pub async fn start_with(behavior: Behavior) -> std::io::Result<Self> {
        let state: Shared = Arc::new(Mutex::new(Inner {
            behavior,
            ..Inner::default()
        }));

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/users/me", get(me))
            .route("/products", get(list_products))
            .route("/carts", post(create_cart))
            .route("/carts/{id}", patch(patch_cart))
            .route("/orders", post(create_order))
            .route("/logistics/shipping/{provider}", post(shipping_quotes))
            .route("/util/address/{cep}", get(lookup_address))
            .route("/util/validate-slug", get(validate_slug))
            .route("/coupons", post(create_coupon))
            .layer(from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://{addr}/"),
            state,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Client settings pointing at this server.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL does not parse.
    pub fn api_config(&self) -> Result<ApiConfig, ConfigError> {
        ApiConfig::new(&self.base_url)
    }

    /// Every request received so far, oldest first.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().await.requests.clone()
    }

    /// Recorded requests matching a method and path.
    pub async fn requests_to(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    /// Change behavior mid-test.
    pub async fn update(&self, change: impl FnOnce(&mut Behavior)) {
        change(&mut self.state.lock().await.behavior);
    }
}

/// A JWT-shaped token whose payload carries `exp`. The signature is junk.
#[must_use]
pub fn fake_jwt(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({"id": 1, "exp": exp}).to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// The panel user every token belongs to.
#[must_use]
pub fn panel_user() -> Value {
    json!({
        "id": "user_1",
        "name": "Ana Operadora",
        "email": "ana@vitrine.test",
        "role": "admin",
    })
}

// =============================================================================
// Middleware
// =============================================================================

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap_or_default();

    state.lock().await.requests.push(RecordedRequest {
        method: parts.method.clone(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        authorization: parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
    });

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn api_error(status: StatusCode, message: &str) -> Response {
    let body = json!({"error": {"status": status.as_u16(), "message": message}});
    (status, Json(body)).into_response()
}

/// 401 unless the bearer token is one we issued and tokens are not revoked.
async fn authorize(state: &Shared, headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {}", fake_jwt(TOKEN_EXPIRY));
    let presented = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if state.lock().await.behavior.revoke_tokens || presented != Some(expected.as_str()) {
        return Err(api_error(StatusCode::UNAUTHORIZED, "Missing or invalid credentials"));
    }
    Ok(())
}

async fn next_id(state: &Shared, prefix: &str) -> String {
    let mut inner = state.lock().await;
    inner.next_id += 1;
    format!("{prefix}_{}", inner.next_id)
}

// =============================================================================
// Handlers
// =============================================================================

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != PASSWORD {
        return api_error(StatusCode::UNAUTHORIZED, "Invalid identifier or password");
    }
    Json(json!({"jwt": fake_jwt(TOKEN_EXPIRY), "user": panel_user()})).into_response()
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&state, &headers).await {
        return denied;
    }
    Json(panel_user()).into_response()
}

async fn list_products(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers).await {
        return denied;
    }
    let page: u32 = params
        .get("pagination[page]")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);
    Json(json!({
        "data": [{"id": "prod_1", "name": "Camiseta Básica", "slug": "camiseta-basica"}],
        "meta": {"page": page, "pageSize": 25, "pageCount": 3, "total": 51},
    }))
    .into_response()
}

async fn create_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&state, &headers).await {
        return denied;
    }
    let id = next_id(&state, "cart").await;
    (StatusCode::CREATED, Json(json!({"id": id, "items": []}))).into_response()
}

async fn patch_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers).await {
        return denied;
    }
    Json(json!({"id": id, "items": body["items"]})).into_response()
}

async fn create_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers).await {
        return denied;
    }
    if state.lock().await.behavior.fail_orders {
        return api_error(StatusCode::BAD_GATEWAY, "Payment gateway unavailable");
    }
    let id = next_id(&state, "order").await;
    let pix = (body["payment"]["method"] == "pix").then(|| {
        json!({"qr_code": "00020126580014br.gov.bcb.pix", "expires_at": "2026-10-16T12:30:00Z"})
    });
    (
        StatusCode::CREATED,
        Json(json!({
            "id": id,
            "status": "pending",
            "payment_status": "waiting_payment",
            "total": 5990,
            "pix": pix,
        })),
    )
        .into_response()
}

async fn shipping_quotes(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(_provider): Path<String>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers).await {
        return denied;
    }
    let quotes = state.lock().await.behavior.quotes.clone();
    Json(Value::Array(quotes)).into_response()
}

async fn lookup_address(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(cep): Path<String>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers).await {
        return denied;
    }
    if cep != KNOWN_CEP {
        return api_error(StatusCode::NOT_FOUND, "CEP not found");
    }
    Json(json!({
        "postal_code": KNOWN_CEP,
        "street": "Av. Champagnat",
        "neighborhood": "Centro",
        "city": "Vila Velha",
        "state": "ES",
    }))
    .into_response()
}

async fn validate_slug(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers).await {
        return denied;
    }
    let value = params.get("value").cloned().unwrap_or_default();
    let available = !state.lock().await.behavior.taken.contains(&value);
    Json(json!({"available": available})).into_response()
}

async fn create_coupon(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers).await {
        return denied;
    }
    let id = next_id(&state, "cpn").await;
    if let Value::Object(map) = &mut body {
        map.insert("id".to_string(), json!(id));
        map.insert("used".to_string(), json!(0));
    }
    (StatusCode::CREATED, Json(body)).into_response()
}
