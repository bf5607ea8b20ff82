//! Order submission with cart compensation.
//!
//! Submitting is two writes: PATCH the cart with customer, addresses and
//! items, then POST the order. If the order fails, the items staged by the
//! PATCH are released with a second PATCH tagging each one `remove`. The
//! release uses the staged payload itself, never the form, which may have
//! changed in between.

use thiserror::Error;
use tracing::{error, info, instrument, warn};

use vitrine_core::{CardExpiry, CardNumber, CartId, Cvv, Document, Email, PhoneNumber, PostalCode};

use super::form::{AddressInput, OrderForm, PaymentMethod, ShippingOption};
use super::shipping::{self, ShippingQuotes};
use super::step::Step;
use super::validation::{FieldErrors, parse_date, validate_all};
use super::wizard::{Notification, Wizard};
use crate::api::{
    Address, ApiError, CardPayment, CartItem, CartPatch, CommerceApi, CreateOrder,
    CustomerIdentity, ItemMethod, MetaEntry, Order, Payment, ShippingSelection,
};

/// Seconds a Pix charge stays payable.
pub const PIX_EXPIRY_SECS: u32 = 1800;

/// Country used when the address has none.
pub const DEFAULT_COUNTRY: &str = "BR";

/// Errors that stop a checkout action.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The form has field errors.
    #[error("Form is invalid: {0}")]
    Invalid(FieldErrors),

    /// Submission was attempted from a step other than Payment.
    #[error("Cannot submit from {0}")]
    NotReady(Step),

    /// The cart PATCH failed; nothing was staged.
    #[error("Cart update failed: {0}")]
    CartUpdate(#[source] ApiError),

    /// The order POST failed after the cart was staged.
    #[error("Order creation failed: {source}")]
    OrderCreation {
        #[source]
        source: ApiError,
        /// Whether the staged items were released.
        compensated: bool,
    },

    /// Shipping quotes could not be fetched.
    #[error("Shipping quote failed: {0}")]
    Shipping(#[source] ApiError),
}

impl CheckoutError {
    /// Whether the failure is worth reporting to Sentry.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::CartUpdate(e) | Self::OrderCreation { source: e, .. } | Self::Shipping(e) => {
                e.is_server_error()
            }
            Self::Invalid(_) | Self::NotReady(_) => false,
        }
    }

    /// The message shown to the operator.
    #[must_use]
    pub fn notification(&self) -> Notification {
        match self {
            Self::Invalid(_) | Self::NotReady(_) => Notification::warning(self.to_string()),
            _ => Notification::error(self.to_string()),
        }
    }
}

// =============================================================================
// Payload builders
// =============================================================================

/// Build the cart PATCH from the form.
///
/// # Errors
///
/// Returns the fields that fail to parse. A form that passed
/// [`validate_all`] always builds.
pub fn build_cart_patch(form: &OrderForm) -> Result<CartPatch, FieldErrors> {
    let mut errors = FieldErrors::new();

    let customer = build_customer(form, &mut errors);
    let address = match &form.shipping_option {
        Some(option) if option.requires_address() => build_address(&form.address, &mut errors),
        // Pickup and eSIM orders carry an address only when one was given.
        _ => build_address(&form.address, &mut FieldErrors::new()),
    };

    let shipping = form.shipping_option.as_ref().map(|option| match option {
        ShippingOption::Carrier { quote } => ShippingSelection {
            option: option.as_str().to_string(),
            quote_id: Some(quote.id.clone()),
            price: Some(quote.price),
        },
        _ => ShippingSelection {
            option: option.as_str().to_string(),
            quote_id: None,
            price: None,
        },
    });

    let items = form
        .items
        .iter()
        .filter_map(|item| {
            item.product_id.as_ref().map(|product_id| CartItem {
                product_id: product_id.clone(),
                variant_id: item.variant_id.clone(),
                quantity: item.quantity,
                method: None,
                meta: item
                    .activation_date
                    .map(MetaEntry::activation_date)
                    .into_iter()
                    .collect(),
            })
        })
        .collect();

    errors.into_result()?;
    Ok(CartPatch {
        customer,
        billing_address: address.clone(),
        shipping_address: address,
        shipping,
        items,
    })
}

/// Build the order POST for a staged cart.
///
/// Addresses are taken from the staged PATCH so both writes agree.
///
/// # Errors
///
/// Returns the payment fields that fail to parse.
pub fn build_order(
    cart_id: &CartId,
    form: &OrderForm,
    staged: &CartPatch,
) -> Result<CreateOrder, FieldErrors> {
    let mut errors = FieldErrors::new();
    let payment = match form.payment.method {
        Some(PaymentMethod::Pix) => Some(Payment::Pix {
            expires_in: PIX_EXPIRY_SECS,
        }),
        Some(PaymentMethod::CreditCard) => {
            let card = &form.payment.card;
            let number = CardNumber::parse(&card.number)
                .map_err(|e| errors.insert("payment.card.number", e.to_string()))
                .ok();
            let expiry = CardExpiry::parse(&card.expiry)
                .map_err(|e| errors.insert("payment.card.expiry", e.to_string()))
                .ok();
            let cvv = Cvv::parse(&card.cvv)
                .map_err(|e| errors.insert("payment.card.cvv", e.to_string()))
                .ok();
            match (number, expiry, cvv) {
                (Some(number), Some(expiry), Some(cvv)) => Some(Payment::CreditCard {
                    card: CardPayment::new(
                        number,
                        card.holder_name.trim().to_string(),
                        expiry,
                        cvv,
                    ),
                    installments: form.payment.installments,
                }),
                _ => None,
            }
        }
        None => {
            errors.insert("payment.method", "choose a payment method");
            None
        }
    };

    match payment {
        Some(payment) if errors.is_empty() => Ok(CreateOrder {
            cart_id: cart_id.clone(),
            billing_address: staged.billing_address.clone(),
            shipping_address: staged.shipping_address.clone(),
            payment,
        }),
        _ => Err(errors),
    }
}

/// The compensating PATCH: the staged items, each tagged `remove`.
#[must_use]
pub fn removal_patch(staged: &CartPatch) -> CartPatch {
    CartPatch {
        items: staged
            .items
            .iter()
            .map(|item| CartItem {
                method: Some(ItemMethod::Remove),
                ..item.clone()
            })
            .collect(),
        ..CartPatch::default()
    }
}

fn build_customer(form: &OrderForm, errors: &mut FieldErrors) -> Option<CustomerIdentity> {
    let identity = &form.identity;
    let email = Email::parse(&identity.email)
        .map_err(|e| errors.insert("identity.email", e.to_string()))
        .ok();
    let document = Document::parse(&identity.document)
        .map_err(|e| errors.insert("identity.document", e.to_string()))
        .ok();
    let phone = PhoneNumber::parse(&identity.phone)
        .map_err(|e| errors.insert("identity.phone", e.to_string()))
        .ok();
    let birth_date = if identity.birth_date.trim().is_empty() {
        None
    } else {
        let parsed = parse_date(&identity.birth_date);
        if parsed.is_none() {
            errors.insert("identity.birth_date", "use dd/mm/yyyy");
        }
        parsed
    };

    Some(CustomerIdentity {
        name: identity.name.trim().to_string(),
        email: email?,
        birth_date,
        document: document?,
        phone: phone?,
    })
}

fn build_address(input: &AddressInput, errors: &mut FieldErrors) -> Option<Address> {
    let postal_code = PostalCode::parse(&input.postal_code)
        .map_err(|e| errors.insert("address.postal_code", e.to_string()))
        .ok()?;
    if input.street.trim().is_empty() {
        errors.insert("address.street", "required");
        return None;
    }

    let complement = input.complement.trim();
    Some(Address {
        postal_code,
        street: input.street.trim().to_string(),
        number: input.number.trim().to_string(),
        complement: (!complement.is_empty()).then(|| complement.to_string()),
        neighborhood: input.neighborhood.trim().to_string(),
        city: input.city.trim().to_string(),
        state: input.state.trim().to_uppercase(),
        country: input
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_COUNTRY)
            .to_string(),
    })
}

// =============================================================================
// Checkout session
// =============================================================================

/// A wizard bound to a server-side cart.
pub struct Checkout<A: CommerceApi> {
    api: A,
    cart_id: CartId,
    shipping_provider: String,
    wizard: Wizard,
}

impl<A: CommerceApi> Checkout<A> {
    /// Create a cart and bind `wizard` to it.
    ///
    /// # Errors
    ///
    /// Returns error if the cart cannot be created.
    pub async fn open(
        api: A,
        shipping_provider: impl Into<String>,
        wizard: Wizard,
    ) -> Result<Self, ApiError> {
        let cart = api.create_cart().await?;
        info!(cart_id = %cart.id, "Checkout opened");
        Ok(Self::resume(api, cart.id, shipping_provider, wizard))
    }

    /// Bind `wizard` to an existing cart.
    #[must_use]
    pub fn resume(
        api: A,
        cart_id: CartId,
        shipping_provider: impl Into<String>,
        wizard: Wizard,
    ) -> Self {
        Self {
            api,
            cart_id,
            shipping_provider: shipping_provider.into(),
            wizard,
        }
    }

    #[must_use]
    pub const fn cart_id(&self) -> &CartId {
        &self.cart_id
    }

    #[must_use]
    pub const fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub const fn wizard_mut(&mut self) -> &mut Wizard {
        &mut self.wizard
    }

    /// Quote shipping for the form's postal code and physical items.
    ///
    /// A free quote, when found, becomes the selected carrier option.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Invalid` for a bad postal code, or
    /// `CheckoutError::Shipping` if the request fails.
    pub async fn quote_shipping(&mut self) -> Result<ShippingQuotes, CheckoutError> {
        let form = self.wizard.form();
        let postal_code = PostalCode::parse(&form.address.postal_code).map_err(|e| {
            let mut errors = FieldErrors::new();
            errors.insert("address.postal_code", e.to_string());
            CheckoutError::Invalid(errors)
        })?;

        let quotes = shipping::quote(&self.api, &self.shipping_provider, &postal_code, &form.items)
            .await
            .map_err(CheckoutError::Shipping)?;

        if let Some(quote) = &quotes.selected {
            self.wizard.form_mut().shipping_option = Some(ShippingOption::Carrier {
                quote: quote.clone(),
            });
        }
        Ok(quotes)
    }

    /// Submit the order from the Payment step.
    ///
    /// On success the wizard enters Confirmation with the created order and
    /// the form is cleared. On failure the wizard stays where it is.
    ///
    /// # Errors
    ///
    /// See [`CheckoutError`]. `OrderCreation` reports whether the staged cart
    /// items were released.
    #[instrument(skip(self), fields(cart_id = %self.cart_id))]
    pub async fn submit(&mut self) -> Result<Order, CheckoutError> {
        let step = self.wizard.current();
        if step != Step::Payment {
            return Err(CheckoutError::NotReady(step));
        }

        let form = self.wizard.form();
        let errors = validate_all(form, self.wizard.today());
        if !errors.is_empty() {
            warn!(fields = errors.len(), "Submission blocked by field errors");
            *self.wizard.errors_mut() = errors.clone();
            return Err(CheckoutError::Invalid(errors));
        }

        let staged = build_cart_patch(form).map_err(CheckoutError::Invalid)?;
        let order = build_order(&self.cart_id, form, &staged).map_err(CheckoutError::Invalid)?;

        info!(items = staged.items.len(), "Staging cart");
        if let Err(e) = self.api.patch_cart(&self.cart_id, &staged).await {
            error!(error = %e, "Cart update failed");
            return Err(CheckoutError::CartUpdate(e));
        }

        match self.api.create_order(&order).await {
            Ok(created) => {
                info!(order_id = %created.id, "Order created");
                self.wizard.complete(created.clone());
                Ok(created)
            }
            Err(e) => {
                error!(error = %e, "Order creation failed, releasing cart items");
                let compensated = self.compensate(&staged).await;
                Err(CheckoutError::OrderCreation {
                    source: e,
                    compensated,
                })
            }
        }
    }

    /// Release the staged items. Failure is logged, never raised.
    async fn compensate(&self, staged: &CartPatch) -> bool {
        let removal = removal_patch(staged);
        match self.api.patch_cart(&self.cart_id, &removal).await {
            Ok(_) => {
                info!(items = removal.items.len(), "Cart items released");
                true
            }
            Err(e) => {
                warn!(error = %e, "Cart compensation failed");
                false
            }
        }
    }
}

impl<A: CommerceApi> std::fmt::Debug for Checkout<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checkout")
            .field("cart_id", &self.cart_id)
            .field("step", &self.wizard.current())
            .finish_non_exhaustive()
    }
}
