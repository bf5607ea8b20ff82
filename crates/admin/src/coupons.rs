//! Coupon forms.
//!
//! The coupon form changes shape with its kind: a percentage coupon has a
//! percent, a fixed coupon an amount, and so on. [`CouponKind`] makes each
//! shape its own variant so a payload can only carry the fields its kind uses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use vitrine_core::{CouponId, Price};

use crate::api::{ApiError, CommerceClient};
use crate::checkout::FieldErrors;

const CODE_LEN: std::ops::RangeInclusive<usize> = 4..=32;

/// Errors that can occur when writing a coupon.
#[derive(Debug, Error)]
pub enum CouponError {
    /// The coupon has field errors.
    #[error("Coupon is invalid: {0}")]
    Invalid(FieldErrors),

    /// The API rejected the write.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Discount rule of a coupon, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CouponKind {
    Percentage {
        percent: u8,
    },
    FixedAmount {
        amount_cents: Price,
    },
    FreeShipping {
        /// Shipping above this is only partly covered.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_shipping_cents: Option<Price>,
    },
    BuyXGetY {
        buy: u32,
        get: u32,
    },
}

/// Body of `POST /coupons` and `PATCH /coupons/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponInput {
    pub code: String,
    #[serde(flatten)]
    pub kind: CouponKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_order_cents: Option<Price>,
}

/// A coupon resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    #[serde(flatten)]
    pub kind: CouponKind,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub used: u32,
}

/// Shape rule for coupon codes: 4 to 32 of `A-Z`, `0-9`, `-`, `_`.
///
/// # Errors
///
/// Returns the message to show on the field.
pub fn validate_code(code: &str) -> Result<(), &'static str> {
    if !CODE_LEN.contains(&code.len()) {
        return Err("code must have 4 to 32 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err("use uppercase letters, digits, - and _");
    }
    Ok(())
}

impl CouponInput {
    /// Validate every field for the coupon's kind.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if let Err(message) = validate_code(&self.code) {
            errors.insert("code", message);
        }

        match &self.kind {
            CouponKind::Percentage { percent } => {
                if !(1..=100).contains(percent) {
                    errors.insert("percent", "percent must be between 1 and 100");
                }
            }
            CouponKind::FixedAmount { amount_cents } => {
                if amount_cents.cents() <= 0 {
                    errors.insert("amount_cents", "amount must be positive");
                }
            }
            CouponKind::FreeShipping { max_shipping_cents } => {
                if max_shipping_cents.is_some_and(|max| max.cents() <= 0) {
                    errors.insert("max_shipping_cents", "cap must be positive");
                }
            }
            CouponKind::BuyXGetY { buy, get } => {
                if *buy == 0 {
                    errors.insert("buy", "buy at least 1");
                }
                if *get == 0 {
                    errors.insert("get", "get at least 1");
                }
            }
        }

        if let (Some(start), Some(end)) = (self.starts_at, self.ends_at)
            && end <= start
        {
            errors.insert("ends_at", "end must be after start");
        }
        if self.usage_limit == Some(0) {
            errors.insert("usage_limit", "limit must be at least 1");
        }
        if self.min_order_cents.is_some_and(|min| min.cents() < 0) {
            errors.insert("min_order_cents", "minimum cannot be negative");
        }

        errors
    }
}

impl CommerceClient {
    /// Create a coupon after validating it.
    ///
    /// # Errors
    ///
    /// Returns `CouponError::Invalid` before any request if the form has
    /// errors, or `CouponError::Api` if the write fails.
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_coupon(&self, input: &CouponInput) -> Result<Coupon, CouponError> {
        input.validate().into_result().map_err(CouponError::Invalid)?;
        let coupon: Coupon = self.post("coupons", input).await?;
        info!(coupon_id = %coupon.id, "Coupon created");
        Ok(coupon)
    }

    /// Replace a coupon's fields after validating them.
    ///
    /// # Errors
    ///
    /// See [`CommerceClient::create_coupon`].
    #[instrument(skip(self, input), fields(coupon_id = %id, code = %input.code))]
    pub async fn update_coupon(
        &self,
        id: &CouponId,
        input: &CouponInput,
    ) -> Result<Coupon, CouponError> {
        input.validate().into_result().map_err(CouponError::Invalid)?;
        let path = format!("coupons/{}", urlencoding::encode(id.as_str()));
        let coupon: Coupon = self.patch(&path, input).await?;
        info!("Coupon updated");
        Ok(coupon)
    }

    /// Delete a coupon.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(coupon_id = %id))]
    pub async fn delete_coupon(&self, id: &CouponId) -> Result<(), ApiError> {
        let path = format!("coupons/{}", urlencoding::encode(id.as_str()));
        self.delete(&path).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn input(kind: CouponKind) -> CouponInput {
        CouponInput {
            code: "BLACK-FRIDAY_26".to_string(),
            kind,
            starts_at: None,
            ends_at: None,
            usage_limit: None,
            min_order_cents: None,
        }
    }

    #[test]
    fn test_validate_code() {
        assert!(validate_code("VIP10").is_ok());
        assert!(validate_code("ABC").is_err());
        assert!(validate_code("vip10").is_err());
        assert!(validate_code("VIP 10").is_err());
        assert!(validate_code(&"A".repeat(33)).is_err());
    }

    #[test]
    fn test_kind_specific_rules() {
        assert!(input(CouponKind::Percentage { percent: 15 }).validate().is_empty());
        assert!(
            input(CouponKind::Percentage { percent: 0 })
                .validate()
                .contains("percent")
        );
        assert!(
            input(CouponKind::Percentage { percent: 101 })
                .validate()
                .contains("percent")
        );
        assert!(
            input(CouponKind::FixedAmount {
                amount_cents: Price::ZERO
            })
            .validate()
            .contains("amount_cents")
        );
        assert!(
            input(CouponKind::FreeShipping {
                max_shipping_cents: None
            })
            .validate()
            .is_empty()
        );
        let errors = input(CouponKind::BuyXGetY { buy: 0, get: 0 }).validate();
        assert!(errors.contains("buy"));
        assert!(errors.contains("get"));
    }

    #[test]
    fn test_common_rules() {
        let mut coupon = input(CouponKind::Percentage { percent: 10 });
        coupon.starts_at = Some("2026-11-27T00:00:00Z".parse().unwrap());
        coupon.ends_at = Some("2026-11-26T00:00:00Z".parse().unwrap());
        coupon.usage_limit = Some(0);
        coupon.min_order_cents = Some(Price::from_cents(-1));

        let errors = coupon.validate();
        assert!(errors.contains("ends_at"));
        assert!(errors.contains("usage_limit"));
        assert!(errors.contains("min_order_cents"));
    }

    #[test]
    fn test_wire_format_is_flat_and_tagged() {
        let coupon = input(CouponKind::BuyXGetY { buy: 2, get: 1 });
        assert_eq!(
            serde_json::to_value(&coupon).unwrap(),
            json!({"code": "BLACK-FRIDAY_26", "kind": "buy_x_get_y", "buy": 2, "get": 1})
        );

        let parsed: CouponInput = serde_json::from_value(json!({
            "code": "FRETE",
            "kind": "free_shipping",
            "max_shipping_cents": 2000
        }))
        .unwrap();
        assert_eq!(
            parsed.kind,
            CouponKind::FreeShipping {
                max_shipping_cents: Some(Price::from_cents(2000))
            }
        );
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let result: Result<CouponInput, _> =
            serde_json::from_value(json!({"code": "ABCD", "kind": "mystery"}));
        assert!(result.is_err());
    }
}
