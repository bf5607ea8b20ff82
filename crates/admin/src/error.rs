//! Unified error handling for the admin library.

use thiserror::Error;

use crate::api::{ApiError, CurrentUser};
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::coupons::CouponError;
use crate::session::SessionError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Commerce API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Session could not be established or has expired.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Checkout could not proceed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Coupon could not be written.
    #[error("Coupon error: {0}")]
    Coupon(#[from] CouponError),

    /// Input failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Input file could not be read or parsed.
    #[error("Input error: {0}")]
    Input(String),
}

impl AppError {
    /// Whether this error should be reported to Sentry.
    ///
    /// Validation failures and rejected credentials are the caller's problem;
    /// server-side failures are ours.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Api(e) => e.is_server_error(),
            Self::Checkout(e) => e.is_reportable(),
            Self::Coupon(CouponError::Api(e)) => e.is_server_error(),
            Self::Coupon(CouponError::Invalid(_)) => false,
            Self::Config(_) | Self::Session(_) | Self::Validation(_) | Self::Input(_) => false,
        }
    }

    /// Log the error and, when reportable, capture it to Sentry.
    pub fn report(&self) {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin operation failed"
            );
        } else {
            tracing::warn!(error = %self, "Admin operation failed");
        }
    }
}

/// Set the Sentry user context from the signed-in panel user.
pub fn set_sentry_user(user: &CurrentUser) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user.id.to_string()),
            email: Some(user.email.clone()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Validation("items: add at least one product".to_string());
        assert_eq!(
            err.to_string(),
            "Validation failed: items: add at least one product"
        );

        let err = AppError::from(ApiError::NotFound("/carts/c1".to_string()));
        assert_eq!(err.to_string(), "API error: Not found: /carts/c1");
    }

    #[test]
    fn test_app_error_reportable() {
        assert!(
            AppError::from(ApiError::Api {
                status: 500,
                message: "boom".to_string()
            })
            .is_reportable()
        );
        assert!(!AppError::from(ApiError::Unauthorized).is_reportable());
        assert!(!AppError::Validation("x".to_string()).is_reportable());
        assert!(!AppError::from(ConfigError::MissingEnvVar("VITRINE_API_URL".to_string())).is_reportable());
    }
}
