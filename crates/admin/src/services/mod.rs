//! Remote field services for admin forms.
//!
//! # Services
//!
//! - `debounce` - Trailing-edge debounce shared by the remote checks
//! - `uniqueness` - Slug and coupon-code uniqueness checks
//! - `address` - CEP lookup and address autofill

pub mod address;
pub mod debounce;
pub mod uniqueness;

pub use address::{AddressAutofill, apply_lookup};
pub use debounce::{Debounced, Debouncer};
pub use uniqueness::{UniquenessChecker, slugify, validate_slug};
