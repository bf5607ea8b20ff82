//! Status enums for orders and payments.
//!
//! Values mirror the commerce API's lowercase snake-case strings.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Canceled,
}

/// Payment outcome reported on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    WaitingPayment,
    Authorized,
    Paid,
    Refused,
    Refunded,
    Expired,
}

impl PaymentStatus {
    /// Whether the payment reached a final state.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(
            self,
            Self::Paid | Self::Refused | Self::Refunded | Self::Expired
        )
    }
}

/// Role of the signed-in panel user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access including access-control management.
    SuperAdmin,
    /// Store management.
    Admin,
    /// Manages a single company's catalog and live streams.
    Seller,
    /// Read-only access.
    Viewer,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SuperAdmin => write!(f, "super_admin"),
            Self::Admin => write!(f, "admin"),
            Self::Seller => write!(f, "seller"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "seller" => Ok(Self::Seller),
            "viewer" => Ok(Self::Viewer),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::WaitingPayment).unwrap(),
            "\"waiting_payment\""
        );
        let status: OrderStatus = serde_json::from_str("\"canceled\"").unwrap();
        assert_eq!(status, OrderStatus::Canceled);
    }

    #[test]
    fn test_user_role_round_trip() {
        for role in [
            UserRole::SuperAdmin,
            UserRole::Admin,
            UserRole::Seller,
            UserRole::Viewer,
        ] {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_payment_is_final() {
        assert!(PaymentStatus::Paid.is_final());
        assert!(!PaymentStatus::WaitingPayment.is_final());
    }
}
