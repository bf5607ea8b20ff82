//! Newtype IDs for type-safe entity references.
//!
//! The commerce API identifies resources with opaque strings. Use the
//! `define_id!` macro to create wrappers that prevent accidentally mixing IDs
//! from different entity types.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<String>`, `From<&str>` and `Into<String>` implementations
///
/// # Example
///
/// ```rust
/// # use vitrine_core::define_id;
/// define_id!(CouponId);
/// define_id!(BannerId);
///
/// let coupon_id = CouponId::new("cp_1");
/// let banner_id = BannerId::new("cp_1");
///
/// // These are different types, so this won't compile:
/// // let _: CouponId = banner_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Resources owned by the commerce API
define_id!(UserId);
define_id!(ProductId);
define_id!(VariantId);
define_id!(OrderId);
define_id!(CartId);
define_id!(CustomerId);
define_id!(CouponId);
define_id!(CategoryId);
define_id!(CompanyId);
define_id!(BannerId);
define_id!(LiveStreamId);
define_id!(BroadcasterId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serde_is_transparent() {
        let id = CartId::new("cart_42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"cart_42\"");
        let back: CartId = serde_json::from_str("\"cart_42\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_id_display_and_conversions() {
        let id = OrderId::from("ord_1");
        assert_eq!(id.to_string(), "ord_1");
        assert_eq!(id.as_str(), "ord_1");
        let raw: String = id.into();
        assert_eq!(raw, "ord_1");
    }
}
