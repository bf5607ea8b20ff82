//! reqwest implementation of the commerce API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use vitrine_core::{CartId, OrderId, PostalCode};

use super::cache::QueryCache;
use super::query::{ListQuery, encode};
use super::types::{
    AddressLookup, Cart, CartPatch, CreateOrder, CurrentUser, LoginResponse, Order, Page, ShippingQuote,
    ShippingQuoteRequest, SlugAvailability, SlugCheck,
};
use super::{ApiError, CommerceApi};
use crate::config::ApiConfig;
use crate::session::{Session, SessionHub, SignOutReason};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Commerce API client.
///
/// Cheap to clone; clones share the HTTP connection pool and the read cache.
/// Build with [`CommerceClient::new`] to sign in, then with
/// [`CommerceClient::with_session`] for authenticated calls.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: Url,
    shipping_provider: String,
    cache: QueryCache,
    hub: Option<SessionHub>,
    authenticated: bool,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl CommerceClient {
    /// Create an anonymous client (sign-in and public utilities only).
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::build(config, None, None)
    }

    /// Create a client that sends `token` as a bearer header.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn authenticated(
        config: &ApiConfig,
        token: &SecretString,
        hub: Option<SessionHub>,
    ) -> Result<Self, ApiError> {
        Self::build(config, Some(token), hub)
    }

    /// Create a client for an established session.
    ///
    /// # Errors
    ///
    /// See [`CommerceClient::authenticated`].
    pub fn with_session(
        config: &ApiConfig,
        session: &Session,
        hub: SessionHub,
    ) -> Result<Self, ApiError> {
        Self::build(config, Some(session.token()), Some(hub))
    }

    fn build(
        config: &ApiConfig,
        token: Option<&SecretString>,
        hub: Option<SessionHub>,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| ApiError::Parse(format!("Invalid token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(CommerceClientInner {
                client,
                base_url: config.base_url.clone(),
                shipping_provider: config.shipping_provider.clone(),
                cache: QueryCache::new(config.cache_ttl),
                hub,
                authenticated: token.is_some(),
            }),
        })
    }

    /// Provider segment used for shipping quotes.
    #[must_use]
    pub fn shipping_provider(&self) -> &str {
        &self.inner.shipping_provider
    }

    /// The shared read cache.
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` on bad credentials, or
    /// `ApiError::Parse` if the returned token is malformed.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Session, ApiError> {
        let body = serde_json::json!({
            "email": email,
            "password": password.expose_secret(),
        });
        let response: LoginResponse = self.post("auth/login", &body).await?;
        let session = Session::new(SecretString::from(response.jwt), response.user)
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        self.inner.cache.put_current_user(session.user()).await;
        if let Some(hub) = &self.inner.hub {
            hub.signed_in(session.user());
        }
        Ok(session)
    }

    /// End the session locally: clear cached reads and notify subscribers.
    pub async fn sign_out(&self) {
        self.inner.cache.clear().await;
        if let Some(hub) = &self.inner.hub {
            hub.signed_out(SignOutReason::UserRequested);
        }
    }

    /// `GET /users/me`, cached.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<CurrentUser, ApiError> {
        if let Some(user) = self.inner.cache.current_user().await {
            return Ok(user);
        }
        let user: CurrentUser = self.get("users/me", None).await?;
        self.inner.cache.put_current_user(&user).await;
        Ok(user)
    }

    // =========================================================================
    // Generic resources
    // =========================================================================

    /// List any collection (`products`, `coupons`, `banners`, ...).
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the page does not parse as `T`.
    #[instrument(skip(self, query))]
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &ListQuery,
    ) -> Result<Page<T>, ApiError> {
        let qs = query.to_query_string();
        self.get(resource, Some(&qs)).await
    }

    /// Fetch one record of any collection.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the record does not exist.
    #[instrument(skip(self))]
    pub async fn find<T: DeserializeOwned>(&self, resource: &str, id: &str) -> Result<T, ApiError> {
        let path = format!("{resource}/{}", urlencoding::encode(id));
        self.get(&path, None).await
    }

    /// `GET /carts/:id`, cached.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(cart_id = %id))]
    pub async fn get_cart(&self, id: &CartId) -> Result<Cart, ApiError> {
        if let Some(cart) = self.inner.cache.cart(id).await {
            return Ok(cart);
        }
        let cart: Cart = self.find("carts", id.as_str()).await?;
        self.inner.cache.put_cart(&cart).await;
        Ok(cart)
    }

    /// `GET /orders/:id`, cached.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        if let Some(order) = self.inner.cache.order(id).await {
            return Ok(order);
        }
        let order: Order = self.find("orders", id.as_str()).await?;
        self.inner.cache.put_order(&order).await;
        Ok(order)
    }

    // =========================================================================
    // Transport
    // =========================================================================

    fn url(&self, path: &str, query: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self
            .inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))?;
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.set_query(Some(query));
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, uuid::Uuid::new_v4().to_string())
    }

    /// Execute a GET request.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<&str>,
    ) -> Result<T, ApiError> {
        let url = self.url(path, query)?;
        let response = self.request(reqwest::Method::GET, url).send().await?;
        self.handle_response(response).await
    }

    /// Execute a POST request.
    pub(crate) async fn post<T: DeserializeOwned, B: serde::Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path, None)?;
        let response = self
            .request(reqwest::Method::POST, url)
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Execute a PATCH request.
    pub(crate) async fn patch<T: DeserializeOwned, B: serde::Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path, None)?;
        let response = self
            .request(reqwest::Method::PATCH, url)
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Execute a DELETE request.
    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path, None)?;
        let response = self.request(reqwest::Method::DELETE, url).send().await?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(self.parse_error(response).await)
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| ApiError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(self.parse_error(response).await)
    }

    /// Parse an error response.
    async fn parse_error(&self, response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return ApiError::RateLimited(retry_after);
        }

        if status == 401 {
            // A rejected token ends the session everywhere, not just here.
            if self.inner.authenticated {
                warn!("API rejected the session token");
                self.inner.cache.clear().await;
                if let Some(hub) = &self.inner.hub {
                    hub.signed_out(SignOutReason::Unauthorized);
                }
            }
            return ApiError::Unauthorized;
        }

        if status == 404 {
            let path = response.url().path().to_string();
            return ApiError::NotFound(path);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or(body);

        ApiError::Api { status, message }
    }
}

#[async_trait]
impl CommerceApi for CommerceClient {
    #[instrument(skip(self))]
    async fn create_cart(&self) -> Result<Cart, ApiError> {
        let cart: Cart = self.post("carts", &serde_json::json!({})).await?;
        debug!(cart_id = %cart.id, "Cart created");
        self.inner.cache.put_cart(&cart).await;
        Ok(cart)
    }

    #[instrument(skip(self, patch), fields(cart_id = %id, items = patch.items.len()))]
    async fn patch_cart(&self, id: &CartId, patch: &CartPatch) -> Result<Cart, ApiError> {
        let path = format!("carts/{}", urlencoding::encode(id.as_str()));
        let cart: Cart = self.patch(&path, patch).await?;
        self.inner.cache.put_cart(&cart).await;
        Ok(cart)
    }

    #[instrument(skip(self, order), fields(cart_id = %order.cart_id))]
    async fn create_order(&self, order: &CreateOrder) -> Result<Order, ApiError> {
        let created: Order = self.post("orders", order).await?;
        debug!(order_id = %created.id, "Order created");
        self.inner.cache.put_order(&created).await;
        // The order consumes the cart server-side.
        self.inner.cache.invalidate_cart(&order.cart_id).await;
        Ok(created)
    }

    #[instrument(skip(self, request), fields(cep = %request.postal_code, items = request.items.len()))]
    async fn shipping_quotes(
        &self,
        provider: &str,
        request: &ShippingQuoteRequest,
    ) -> Result<Vec<ShippingQuote>, ApiError> {
        let path = format!("logistics/shipping/{}", urlencoding::encode(provider));
        self.post(&path, request).await
    }

    #[instrument(skip(self), fields(cep = %cep))]
    async fn lookup_address(&self, cep: &PostalCode) -> Result<AddressLookup, ApiError> {
        if let Some(address) = self.inner.cache.address(cep.digits()).await {
            return Ok(address);
        }
        let path = format!("util/address/{}", cep.digits());
        let address: AddressLookup = self.get(&path, None).await?;
        self.inner.cache.put_address(&address).await;
        Ok(address)
    }

    #[instrument(skip(self), fields(collection = %check.collection, value = %check.value))]
    async fn slug_available(&self, check: &SlugCheck) -> Result<bool, ApiError> {
        let params =
            serde_json::to_value(check).map_err(|e| ApiError::Parse(e.to_string()))?;
        let result: SlugAvailability = self
            .get("util/validate-slug", Some(&encode(&params)))
            .await?;
        Ok(result.available)
    }
}

impl std::fmt::Debug for CommerceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("authenticated", &self.inner.authenticated)
            .finish_non_exhaustive()
    }
}
