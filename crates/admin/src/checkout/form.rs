//! Raw order form state, as typed by the operator.
//!
//! Fields hold strings exactly as entered (masked or not). Parsing into API
//! types happens in validation and submission, never here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use vitrine_core::{ProductId, VariantId};

use crate::api::ShippingQuote;

/// The whole order form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderForm {
    pub items: Vec<LineItemInput>,
    pub identity: IdentityInput,
    pub address: AddressInput,
    pub shipping_option: Option<ShippingOption>,
    pub payment: PaymentInput,
}

impl OrderForm {
    /// Clear every field, line items included.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether any line item ships physically.
    #[must_use]
    pub fn has_physical_items(&self) -> bool {
        self.items.iter().any(|item| !item.digital)
    }
}

/// One product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItemInput {
    pub product_id: Option<ProductId>,
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
    /// eSIM/digital activation date.
    pub activation_date: Option<NaiveDate>,
    /// Digital goods are never shipped or quoted.
    pub digital: bool,
}

impl Default for LineItemInput {
    fn default() -> Self {
        Self {
            product_id: None,
            variant_id: None,
            quantity: 1,
            activation_date: None,
            digital: false,
        }
    }
}

/// Customer identification fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityInput {
    pub name: String,
    pub email: String,
    /// CPF or CNPJ, masked or bare.
    pub document: String,
    /// Formatted phone, e.g. `27 9 1234-5678`.
    pub phone: String,
    /// `dd/mm/yyyy` or ISO; optional.
    pub birth_date: String,
}

/// Shipping/billing address fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressInput {
    pub postal_code: String,
    pub street: String,
    pub number: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    /// Defaults to `BR` on submission.
    pub country: Option<String>,
}

/// How the order reaches the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShippingOption {
    /// Delivered by a carrier at the quoted price.
    Carrier { quote: ShippingQuote },
    /// Picked up at the store.
    WithdrawNow,
    /// Digital delivery.
    Esim,
}

impl ShippingOption {
    /// Only carrier delivery needs a shipping address.
    #[must_use]
    pub const fn requires_address(&self) -> bool {
        matches!(self, Self::Carrier { .. })
    }

    /// Wire name of the option.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Carrier { .. } => "carrier",
            Self::WithdrawNow => "withdraw_now",
            Self::Esim => "esim",
        }
    }
}

/// Payment method choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Pix,
    CreditCard,
}

/// Payment fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentInput {
    pub method: Option<PaymentMethod>,
    pub card: CardInput,
    pub installments: u8,
}

impl Default for PaymentInput {
    fn default() -> Self {
        Self {
            method: None,
            card: CardInput::default(),
            installments: 1,
        }
    }
}

/// Credit card fields as typed.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardInput {
    pub number: String,
    pub holder_name: String,
    /// `MM/YY` or `MM/YYYY`.
    pub expiry: String,
    pub cvv: String,
}

impl std::fmt::Debug for CardInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardInput")
            .field("number", &"[REDACTED]")
            .field("holder_name", &self.holder_name)
            .field("expiry", &self.expiry)
            .field("cvv", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_clears_items() {
        let mut form = OrderForm {
            items: vec![LineItemInput {
                product_id: Some(ProductId::new("p1")),
                ..LineItemInput::default()
            }],
            shipping_option: Some(ShippingOption::WithdrawNow),
            ..OrderForm::default()
        };
        form.identity.name = "Ana".to_string();

        form.reset();

        assert!(form.items.is_empty());
        assert_eq!(form, OrderForm::default());
    }

    #[test]
    fn test_shipping_option_from_yaml_like_json() {
        let option: ShippingOption = serde_json::from_str(r#"{"kind":"withdraw_now"}"#).unwrap();
        assert_eq!(option, ShippingOption::WithdrawNow);
        assert!(!option.requires_address());

        let carrier: ShippingOption = serde_json::from_str(
            r#"{"kind":"carrier","quote":{"id":"q1","service":"SEDEX","price":2590}}"#,
        )
        .unwrap();
        assert!(carrier.requires_address());
        assert_eq!(carrier.as_str(), "carrier");
    }

    #[test]
    fn test_card_input_debug_is_redacted() {
        let card = CardInput {
            number: "4111111111111111".to_string(),
            cvv: "123".to_string(),
            ..CardInput::default()
        };
        let debug = format!("{card:?}");
        assert!(!debug.contains("4111111111111111"));
        assert!(!debug.contains("123"));
    }

    #[test]
    fn test_has_physical_items() {
        let mut form = OrderForm::default();
        form.items.push(LineItemInput {
            digital: true,
            ..LineItemInput::default()
        });
        assert!(!form.has_physical_items());
        form.items.push(LineItemInput::default());
        assert!(form.has_physical_items());
    }
}
