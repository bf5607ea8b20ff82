//! Commerce API request and response types.
//!
//! Requests are typed structs and tagged enums so a payload is validated once,
//! when it is built, instead of being assembled from loosely typed form state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use vitrine_core::{
    CardExpiry, CardNumber, CartId, CompanyId, CouponId, Cvv, Document, Email, OrderId, OrderStatus,
    PaymentStatus, PhoneNumber, PostalCode, Price, ProductId, UserId, UserRole, VariantId,
};

// =============================================================================
// Envelopes
// =============================================================================

/// A page of a list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: PageMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub total: u64,
}

impl PageMeta {
    /// Whether a further page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.page_count
    }
}

// =============================================================================
// Auth
// =============================================================================

/// The signed-in panel user (`/users/me`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub company_id: Option<CompanyId>,
}

/// Response of `/auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub jwt: String,
    pub user: CurrentUser,
}

// =============================================================================
// Cart
// =============================================================================

/// Postal address as the API stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub postal_code: PostalCode,
    pub street: String,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

/// Customer identity attached to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerIdentity {
    pub name: String,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    pub document: Document,
    pub phone: PhoneNumber,
}

/// How the API should apply a cart item in a PATCH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemMethod {
    /// Add the quantity to the cart (the API default when omitted).
    Add,
    /// Remove the item from the cart.
    Remove,
}

/// Typed value of a [`MetaEntry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum MetaValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Json(serde_json::Value),
}

/// Extensible key/value data attached to a line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub key: String,
    #[serde(flatten)]
    pub value: MetaValue,
}

impl MetaEntry {
    /// Meta key carrying an eSIM/digital activation date.
    pub const ACTIVATION_DATE: &'static str = "activation_date";

    /// Build an `activation_date` entry (ISO date string).
    #[must_use]
    pub fn activation_date(date: NaiveDate) -> Self {
        Self {
            key: Self::ACTIVATION_DATE.to_string(),
            value: MetaValue::String(date.format("%Y-%m-%d").to_string()),
        }
    }
}

/// A line item in a cart PATCH or cart response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<ItemMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meta: Vec<MetaEntry>,
}

/// Shipping choice recorded on the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingSelection {
    /// `carrier`, `withdraw_now` or `esim`.
    pub option: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
}

/// Body of `PATCH /carts/:id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CartPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<ShippingSelection>,
    pub items: Vec<CartItem>,
}

/// A cart resource.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Cart {
    pub id: CartId,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub subtotal: Option<Price>,
    #[serde(default)]
    pub customer: Option<CustomerIdentity>,
}

// =============================================================================
// Order
// =============================================================================

/// Card fields sent with a credit card payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardPayment {
    pub number: CardNumber,
    pub holder_name: String,
    pub exp_month: u32,
    pub exp_year: i32,
    pub cvv: Cvv,
}

impl CardPayment {
    /// Assemble card fields from parsed parts.
    #[must_use]
    pub fn new(number: CardNumber, holder_name: String, expiry: CardExpiry, cvv: Cvv) -> Self {
        Self {
            number,
            holder_name,
            exp_month: expiry.month,
            exp_year: expiry.year,
            cvv,
        }
    }
}

/// Payment sub-object of an order, tagged by `method`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Payment {
    Pix {
        /// Seconds until the Pix charge expires.
        expires_in: u32,
    },
    CreditCard {
        card: CardPayment,
        installments: u8,
    },
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOrder {
    pub cart_id: CartId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    pub payment: Payment,
}

/// Pix charge details returned on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixCharge {
    pub qr_code: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// An order resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub total: Option<Price>,
    #[serde(default)]
    pub pix: Option<PixCharge>,
}

// =============================================================================
// Logistics & utilities
// =============================================================================

/// An item to quote shipping for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingItem {
    pub product_id: ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
}

/// Body of `POST /logistics/shipping/:provider`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingQuoteRequest {
    pub postal_code: PostalCode,
    pub items: Vec<ShippingItem>,
}

/// A shipping quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub id: String,
    pub service: String,
    pub price: Price,
    #[serde(default)]
    pub delivery_days: Option<u32>,
}

/// Response of `/util/address/:cep`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressLookup {
    pub postal_code: PostalCode,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

/// Query of `/util/validate-slug`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlugCheck {
    /// Resource collection, e.g. `products` or `coupons`.
    pub collection: String,
    /// Record being edited, excluded from the uniqueness check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_id: Option<String>,
    /// Field holding the unique value, e.g. `slug` or `code`.
    pub field: String,
    pub value: String,
}

impl SlugCheck {
    /// Check a product slug.
    #[must_use]
    pub fn product_slug(value: impl Into<String>) -> Self {
        Self {
            collection: "products".to_string(),
            exclude_id: None,
            field: "slug".to_string(),
            value: value.into(),
        }
    }

    /// Check a coupon code, excluding the coupon being edited.
    #[must_use]
    pub fn coupon_code(value: impl Into<String>, editing: Option<&CouponId>) -> Self {
        Self {
            collection: "coupons".to_string(),
            exclude_id: editing.map(ToString::to_string),
            field: "code".to_string(),
            value: value.into(),
        }
    }
}

/// Response of `/util/validate-slug`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SlugAvailability {
    pub available: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_meta_entry_wire_format() {
        let entry = MetaEntry::activation_date(NaiveDate::from_ymd_opt(2026, 11, 2).unwrap());
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"key": "activation_date", "type": "string", "value": "2026-11-02"})
        );

        let parsed: MetaEntry =
            serde_json::from_value(json!({"key": "gift", "type": "bool", "value": true})).unwrap();
        assert_eq!(parsed.value, MetaValue::Bool(true));
    }

    #[test]
    fn test_cart_item_omits_empty_fields() {
        let item = CartItem {
            product_id: ProductId::new("p1"),
            variant_id: None,
            quantity: 2,
            method: None,
            meta: vec![],
        };
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({"product_id": "p1", "quantity": 2})
        );
    }

    #[test]
    fn test_payment_is_tagged_by_method() {
        let pix = Payment::Pix { expires_in: 1800 };
        assert_eq!(
            serde_json::to_value(&pix).unwrap(),
            json!({"method": "pix", "expires_in": 1800})
        );

        let card = Payment::CreditCard {
            card: CardPayment::new(
                CardNumber::parse("4111 1111 1111 1111").unwrap(),
                "ANA SOUZA".to_string(),
                CardExpiry::parse("08/29").unwrap(),
                Cvv::parse("123").unwrap(),
            ),
            installments: 3,
        };
        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["method"], "credit_card");
        assert_eq!(value["card"]["number"], "4111111111111111");
        assert_eq!(value["card"]["exp_month"], 8);
        assert_eq!(value["card"]["exp_year"], 2029);
        assert_eq!(value["installments"], 3);
    }

    #[test]
    fn test_page_meta_has_next() {
        let page: Page<ShippingQuote> = serde_json::from_value(json!({
            "data": [],
            "meta": {"page": 1, "pageSize": 25, "pageCount": 3, "total": 60}
        }))
        .unwrap();
        assert!(page.meta.has_next());
    }

    #[test]
    fn test_slug_check_coupon_excludes_edited_record() {
        let id = CouponId::new("cp_9");
        let check = SlugCheck::coupon_code("BLACKFRIDAY", Some(&id));
        assert_eq!(check.collection, "coupons");
        assert_eq!(check.exclude_id.as_deref(), Some("cp_9"));
    }
}
