//! Query cache for commerce API reads.
//!
//! Reads are cached by key; writes replace the affected entry with the
//! resource the API returned, so a later read never sees the pre-write state.

use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use vitrine_core::{CartId, OrderId};

use super::types::{AddressLookup, Cart, CurrentUser, Order};

const MAX_ENTRIES: u64 = 1_000;

/// Cache key for API reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    CurrentUser,
    Cart(CartId),
    Order(OrderId),
    /// Address lookup, keyed by unmasked CEP.
    Address(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    CurrentUser(Box<CurrentUser>),
    Cart(Box<Cart>),
    Order(Box<Order>),
    Address(Box<AddressLookup>),
}

/// Shared TTL cache of API reads.
#[derive(Clone)]
pub struct QueryCache {
    inner: Cache<CacheKey, CacheValue>,
}

impl QueryCache {
    /// Create a cache whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn current_user(&self) -> Option<CurrentUser> {
        match self.inner.get(&CacheKey::CurrentUser).await {
            Some(CacheValue::CurrentUser(user)) => {
                debug!("Cache hit for current user");
                Some(*user)
            }
            _ => None,
        }
    }

    pub async fn cart(&self, id: &CartId) -> Option<Cart> {
        match self.inner.get(&CacheKey::Cart(id.clone())).await {
            Some(CacheValue::Cart(cart)) => {
                debug!(cart_id = %id, "Cache hit for cart");
                Some(*cart)
            }
            _ => None,
        }
    }

    pub async fn order(&self, id: &OrderId) -> Option<Order> {
        match self.inner.get(&CacheKey::Order(id.clone())).await {
            Some(CacheValue::Order(order)) => {
                debug!(order_id = %id, "Cache hit for order");
                Some(*order)
            }
            _ => None,
        }
    }

    pub async fn address(&self, cep: &str) -> Option<AddressLookup> {
        match self.inner.get(&CacheKey::Address(cep.to_string())).await {
            Some(CacheValue::Address(address)) => {
                debug!(cep, "Cache hit for address");
                Some(*address)
            }
            _ => None,
        }
    }

    pub async fn put_current_user(&self, user: &CurrentUser) {
        self.inner
            .insert(
                CacheKey::CurrentUser,
                CacheValue::CurrentUser(Box::new(user.clone())),
            )
            .await;
    }

    pub async fn put_cart(&self, cart: &Cart) {
        self.inner
            .insert(
                CacheKey::Cart(cart.id.clone()),
                CacheValue::Cart(Box::new(cart.clone())),
            )
            .await;
    }

    pub async fn put_order(&self, order: &Order) {
        self.inner
            .insert(
                CacheKey::Order(order.id.clone()),
                CacheValue::Order(Box::new(order.clone())),
            )
            .await;
    }

    pub async fn put_address(&self, address: &AddressLookup) {
        self.inner
            .insert(
                CacheKey::Address(address.postal_code.digits().to_string()),
                CacheValue::Address(Box::new(address.clone())),
            )
            .await;
    }

    /// Drop a cached cart, e.g. after a write whose response was not a cart.
    pub async fn invalidate_cart(&self, id: &CartId) {
        self.inner.invalidate(&CacheKey::Cart(id.clone())).await;
    }

    /// Drop everything. Used on sign-out so the next user never sees stale data.
    pub async fn clear(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vitrine_core::{OrderStatus, PaymentStatus, PostalCode};

    use super::*;

    fn cart(id: &str) -> Cart {
        Cart {
            id: CartId::new(id),
            items: vec![],
            subtotal: None,
            customer: None,
        }
    }

    #[tokio::test]
    async fn test_cart_roundtrip_and_invalidate() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let id = CartId::new("cart_1");
        assert!(cache.cart(&id).await.is_none());

        cache.put_cart(&cart("cart_1")).await;
        assert_eq!(cache.cart(&id).await.unwrap().id, id);

        cache.invalidate_cart(&id).await;
        assert!(cache.cart(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_keys_do_not_collide() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.put_cart(&cart("x1")).await;
        cache
            .put_order(&Order {
                id: OrderId::new("x1"),
                status: OrderStatus::Pending,
                payment_status: PaymentStatus::WaitingPayment,
                total: None,
                pix: None,
            })
            .await;

        assert!(cache.cart(&CartId::new("x1")).await.is_some());
        assert!(cache.order(&OrderId::new("x1")).await.is_some());
    }

    #[tokio::test]
    async fn test_address_keyed_by_digits() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache
            .put_address(&AddressLookup {
                postal_code: PostalCode::parse("29100-000").unwrap(),
                street: "Av. Champagnat".to_string(),
                neighborhood: "Centro".to_string(),
                city: "Vila Velha".to_string(),
                state: "ES".to_string(),
            })
            .await;
        assert_eq!(cache.address("29100000").await.unwrap().city, "Vila Velha");
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.put_cart(&cart("c")).await;
        cache.clear().await;
        assert!(cache.cart(&CartId::new("c")).await.is_none());
    }
}
