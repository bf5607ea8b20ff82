//! Commerce REST API client.
//!
//! The panel is a front end over a headless commerce API. This module holds
//! the typed DTOs, the nested query-string encoder, the read cache and the
//! reqwest client.
//!
//! # Authentication
//!
//! `POST /auth/login` returns a JWT. Authenticated clients send it as a
//! default `Authorization: Bearer <jwt>` header. A 401 from any endpoint
//! broadcasts a sign-out through the [`SessionHub`](crate::session::SessionHub).

mod cache;
mod client;
mod query;
mod types;

pub use cache::{CacheKey, CacheValue, QueryCache};
pub use client::CommerceClient;
pub use query::{ListQuery, Pagination, SortDirection, encode as encode_query};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use vitrine_core::{CartId, PostalCode};

/// Errors that can occur when talking to the commerce API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Missing or rejected bearer token.
    #[error("Unauthorized: session is missing or expired")]
    Unauthorized,

    /// A request path did not form a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Whether the failure came from the server side (and is worth reporting).
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Http(_) | Self::Parse(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// The API operations the checkout depends on.
///
/// [`CommerceClient`] is the production implementation; tests substitute an
/// in-memory fake.
#[async_trait]
pub trait CommerceApi: Send + Sync {
    /// `POST /carts`
    async fn create_cart(&self) -> Result<Cart, ApiError>;

    /// `PATCH /carts/:id`
    async fn patch_cart(&self, id: &CartId, patch: &CartPatch) -> Result<Cart, ApiError>;

    /// `POST /orders`
    async fn create_order(&self, order: &CreateOrder) -> Result<Order, ApiError>;

    /// `POST /logistics/shipping/:provider`
    async fn shipping_quotes(
        &self,
        provider: &str,
        request: &ShippingQuoteRequest,
    ) -> Result<Vec<ShippingQuote>, ApiError>;

    /// `GET /util/address/:cep`
    async fn lookup_address(&self, cep: &PostalCode) -> Result<AddressLookup, ApiError>;

    /// `GET /util/validate-slug`; `true` when the value is free.
    async fn slug_available(&self, check: &SlugCheck) -> Result<bool, ApiError>;
}
