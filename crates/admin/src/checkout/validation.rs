//! Per-step field validation.
//!
//! Each step validates only the fields it owns. Conditional fields are
//! skipped structurally: a pickup or eSIM order never looks at the address,
//! a Pix payment never looks at the card.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use vitrine_core::{CardExpiry, CardNumber, Cvv, Document, Email, PhoneNumber, PostalCode};

use super::form::{AddressInput, IdentityInput, LineItemInput, OrderForm, PaymentInput, PaymentMethod};
use super::step::Step;

const MIN_NAME_CHARS: usize = 3;
const MAX_INSTALLMENTS: u8 = 12;

/// Field path -> message. Ordered so output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error. The first message for a field wins.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn extend(&mut self, other: Self) {
        for (field, message) in other.0 {
            self.insert(field, message);
        }
    }

    /// Drop the error for one field.
    pub fn remove(&mut self, field: &str) {
        self.0.remove(field);
    }

    /// `Ok(())` when empty.
    ///
    /// # Errors
    ///
    /// Returns `self` when any field has an error.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Validate the fields owned by `step`. `today` anchors date rules.
#[must_use]
pub fn validate_step(step: Step, form: &OrderForm, today: NaiveDate) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match step {
        Step::Products => validate_items(&form.items, today, &mut errors),
        Step::Identification => validate_identity(&form.identity, today, &mut errors),
        Step::Shipping => match &form.shipping_option {
            None => errors.insert("shipping_option", "choose a shipping option"),
            Some(option) if option.requires_address() => {
                validate_address(&form.address, &mut errors);
            }
            Some(_) => {}
        },
        Step::Payment => validate_payment(&form.payment, today, &mut errors),
        Step::Confirmation => {}
    }
    errors
}

/// Validate every step before Confirmation.
#[must_use]
pub fn validate_all(form: &OrderForm, today: NaiveDate) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for step in Step::ALL.into_iter().filter(|s| *s < Step::Confirmation) {
        errors.extend(validate_step(step, form, today));
    }
    errors
}

/// Whether at least one row has a product and a positive quantity.
#[must_use]
pub fn has_line_items(items: &[LineItemInput]) -> bool {
    items
        .iter()
        .any(|item| item.product_id.is_some() && item.quantity >= 1)
}

fn validate_items(items: &[LineItemInput], today: NaiveDate, errors: &mut FieldErrors) {
    if !has_line_items(items) {
        errors.insert("items", "add at least one product");
    }
    for (i, item) in items.iter().enumerate() {
        if item.product_id.is_none() {
            errors.insert(format!("items[{i}].product_id"), "select a product");
        }
        if item.quantity == 0 {
            errors.insert(format!("items[{i}].quantity"), "quantity must be at least 1");
        }
        if item.activation_date.is_some_and(|date| date < today) {
            errors.insert(
                format!("items[{i}].activation_date"),
                "activation date cannot be in the past",
            );
        }
    }
}

fn validate_identity(identity: &IdentityInput, today: NaiveDate, errors: &mut FieldErrors) {
    if identity.name.trim().chars().count() < MIN_NAME_CHARS {
        errors.insert(
            "identity.name",
            format!("name must have at least {MIN_NAME_CHARS} characters"),
        );
    }
    if let Err(e) = Email::parse(&identity.email) {
        errors.insert("identity.email", e.to_string());
    }
    if let Err(e) = Document::parse(&identity.document) {
        errors.insert("identity.document", e.to_string());
    }
    if let Err(e) = PhoneNumber::parse(&identity.phone) {
        errors.insert("identity.phone", e.to_string());
    }
    if !identity.birth_date.trim().is_empty() {
        match parse_date(&identity.birth_date) {
            None => errors.insert("identity.birth_date", "use dd/mm/yyyy"),
            Some(date) if date >= today => {
                errors.insert("identity.birth_date", "birth date must be in the past");
            }
            Some(_) => {}
        }
    }
}

fn validate_address(address: &AddressInput, errors: &mut FieldErrors) {
    if let Err(e) = PostalCode::parse(&address.postal_code) {
        errors.insert("address.postal_code", e.to_string());
    }
    let required = [
        ("address.street", &address.street),
        ("address.number", &address.number),
        ("address.neighborhood", &address.neighborhood),
        ("address.city", &address.city),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.insert(field, "required");
        }
    }
    let state = address.state.trim();
    if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
        errors.insert("address.state", "use the two-letter state code");
    }
}

fn validate_payment(payment: &PaymentInput, today: NaiveDate, errors: &mut FieldErrors) {
    match payment.method {
        None => errors.insert("payment.method", "choose a payment method"),
        Some(PaymentMethod::Pix) => {}
        Some(PaymentMethod::CreditCard) => {
            let card = &payment.card;
            if let Err(e) = CardNumber::parse(&card.number) {
                errors.insert("payment.card.number", e.to_string());
            }
            if card.holder_name.trim().chars().count() < MIN_NAME_CHARS {
                errors.insert("payment.card.holder_name", "enter the name printed on the card");
            }
            match CardExpiry::parse(&card.expiry) {
                Err(e) => errors.insert("payment.card.expiry", e.to_string()),
                Ok(expiry) if expiry.is_expired_at(today) => {
                    errors.insert("payment.card.expiry", "card is expired");
                }
                Ok(_) => {}
            }
            if let Err(e) = Cvv::parse(&card.cvv) {
                errors.insert("payment.card.cvv", e.to_string());
            }
            if !(1..=MAX_INSTALLMENTS).contains(&payment.installments) {
                errors.insert(
                    "payment.installments",
                    format!("installments must be between 1 and {MAX_INSTALLMENTS}"),
                );
            }
        }
    }
}

/// Parse `dd/mm/yyyy` or ISO `yyyy-mm-dd`.
#[must_use]
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(input, "%Y-%m-%d"))
        .ok()
}
