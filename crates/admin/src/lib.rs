//! Vitrine Admin library.
//!
//! The logic layer of the Vitrine admin panel: a typed client for the
//! headless commerce REST API, the multi-step order checkout wizard, and the
//! remote field checks the panel forms rely on.
//!
//! # Security
//!
//! An authenticated client can create orders and charge cards. Keep panel
//! credentials in the environment (see [`config`]), never in code.
//!
//! # Modules
//!
//! - [`api`] - REST client, DTOs, query encoding and read cache
//! - [`session`] - Explicit session value and sign-in/sign-out broadcast
//! - [`checkout`] - Wizard state machine, step validation and submission
//! - [`services`] - Debounced uniqueness checks and CEP autofill
//! - [`coupons`] - Coupon form union and its writes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod config;
pub mod coupons;
pub mod error;
pub mod services;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiError, CommerceApi, CommerceClient};
pub use checkout::{Checkout, CheckoutError, Wizard};
pub use config::AdminConfig;
pub use error::AppError;
pub use session::{Session, SessionHub};
