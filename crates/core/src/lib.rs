//! Vitrine Core - Shared types library.
//!
//! This crate provides common types used across the Vitrine components:
//! - `admin` - Commerce API client, checkout wizard and form validation
//! - `cli` - Command-line driver for checkout, shipping and lookups
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, prices, emails, Brazilian documents, phones, postal codes,
//!   card fields and the masks they share

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
