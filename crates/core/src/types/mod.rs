//! Core types for Vitrine.
//!
//! This module provides type-safe wrappers for common domain concepts.
//! Every masked input type exposes `parse` (accepts masked or bare digits),
//! `digits` (unmasked) and `masked` (display form).

pub mod card;
pub mod document;
pub mod email;
pub mod id;
pub mod mask;
pub mod phone;
pub mod postal_code;
pub mod price;
pub mod status;

pub use card::{CardError, CardExpiry, CardNumber, Cvv};
pub use document::{Document, DocumentError, DocumentKind};
pub use email::{Email, EmailError};
pub use id::*;
pub use mask::{apply_mask, digits_only};
pub use phone::{PhoneError, PhoneNumber};
pub use postal_code::{PostalCode, PostalCodeError};
pub use price::{CurrencyCode, Price};
pub use status::*;
