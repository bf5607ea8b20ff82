//! Multi-step order checkout.
//!
//! The wizard walks Products -> Identification -> Shipping -> Payment ->
//! Confirmation. Forward moves are gated by named guards; the final submit
//! stages the cart, creates the order, and releases the cart items if the
//! order fails.
//!
//! ```
//! use chrono::NaiveDate;
//! use vitrine_admin::checkout::{Guard, Step, Transition, Wizard};
//!
//! let mut wizard = Wizard::with_today(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
//! let transition = wizard.advance();
//! assert!(matches!(transition, Transition::Blocked { guard: Guard::HasLineItems, .. }));
//! assert_eq!(wizard.current(), Step::Products);
//! ```

mod form;
mod shipping;
mod step;
mod submission;
mod validation;
mod wizard;

pub use form::{
    AddressInput, CardInput, IdentityInput, LineItemInput, OrderForm, PaymentInput,
    PaymentMethod, ShippingOption,
};
pub use shipping::{ShippingQuotes, physical_items, quote as quote_shipping, select_free_quote};
pub use step::{Guard, Step, guards};
pub use submission::{
    Checkout, CheckoutError, DEFAULT_COUNTRY, PIX_EXPIRY_SECS, build_cart_patch, build_order,
    removal_patch,
};
pub use validation::{FieldErrors, has_line_items, parse_date, validate_all, validate_step};
pub use wizard::{Notification, NotificationLevel, Transition, Wizard};
