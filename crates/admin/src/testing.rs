//! In-memory `CommerceApi` for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use vitrine_core::{CartId, OrderId, OrderStatus, PaymentStatus, PostalCode};

use crate::api::{
    AddressLookup, ApiError, Cart, CartPatch, CommerceApi, CreateOrder, Order, ShippingQuote,
    ShippingQuoteRequest, SlugCheck,
};

/// A call the fake received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateCart,
    PatchCart(CartId, CartPatch),
    CreateOrder(CreateOrder),
    ShippingQuotes(String, ShippingQuoteRequest),
    LookupAddress(PostalCode),
    SlugAvailable(SlugCheck),
}

/// Records calls and answers from canned data.
#[derive(Clone, Default)]
pub struct FakeApi {
    pub calls: Arc<Mutex<Vec<Call>>>,
    /// Fail the N-th (0-based) cart PATCH.
    pub fail_patch_at: Option<usize>,
    pub fail_order: bool,
    pub quotes: Vec<ShippingQuote>,
    pub address: Option<AddressLookup>,
    pub taken_slugs: Vec<String>,
}

impl FakeApi {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn patches(&self) -> Vec<CartPatch> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::PatchCart(_, patch) => Some(patch),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(call);
    }

    fn server_error(message: &str) -> ApiError {
        ApiError::Api {
            status: 500,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl CommerceApi for FakeApi {
    async fn create_cart(&self) -> Result<Cart, ApiError> {
        self.record(Call::CreateCart);
        Ok(Cart {
            id: CartId::new("cart_fake"),
            items: vec![],
            subtotal: None,
            customer: None,
        })
    }

    async fn patch_cart(&self, id: &CartId, patch: &CartPatch) -> Result<Cart, ApiError> {
        let attempt = self.patches().len();
        self.record(Call::PatchCart(id.clone(), patch.clone()));
        if self.fail_patch_at == Some(attempt) {
            return Err(Self::server_error("cart update failed"));
        }
        Ok(Cart {
            id: id.clone(),
            items: patch.items.clone(),
            subtotal: None,
            customer: patch.customer.clone(),
        })
    }

    async fn create_order(&self, order: &CreateOrder) -> Result<Order, ApiError> {
        self.record(Call::CreateOrder(order.clone()));
        if self.fail_order {
            return Err(Self::server_error("payment gateway unavailable"));
        }
        Ok(Order {
            id: OrderId::new("order_fake"),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::WaitingPayment,
            total: None,
            pix: None,
        })
    }

    async fn shipping_quotes(
        &self,
        provider: &str,
        request: &ShippingQuoteRequest,
    ) -> Result<Vec<ShippingQuote>, ApiError> {
        self.record(Call::ShippingQuotes(provider.to_string(), request.clone()));
        Ok(self.quotes.clone())
    }

    async fn lookup_address(&self, cep: &PostalCode) -> Result<AddressLookup, ApiError> {
        self.record(Call::LookupAddress(cep.clone()));
        self.address
            .clone()
            .ok_or_else(|| ApiError::NotFound(format!("/util/address/{}", cep.digits())))
    }

    async fn slug_available(&self, check: &SlugCheck) -> Result<bool, ApiError> {
        self.record(Call::SlugAvailable(check.clone()));
        Ok(!self.taken_slugs.contains(&check.value))
    }
}
