//! Checkout wizard state machine.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use super::form::OrderForm;
use super::step::{Guard, Step, guards};
use super::validation::{FieldErrors, has_line_items, validate_step};
use crate::api::Order;

/// Severity of a [`Notification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A non-blocking message for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Moved { from: Step, to: Step },
    /// Target equals the current step, or the wizard is finished.
    Stayed,
    /// A guard failed; the state is unchanged.
    Blocked {
        guard: Guard,
        notification: Notification,
    },
}

impl Transition {
    #[must_use]
    pub const fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// The checkout wizard: current step, visited steps, the form and its errors.
///
/// Forward moves run the guards from [`guards`]; backward moves are free.
/// Confirmation is terminal and only entered through a successful submission.
#[derive(Debug, Clone)]
pub struct Wizard {
    current: Step,
    visited: BTreeSet<Step>,
    form: OrderForm,
    errors: FieldErrors,
    today: NaiveDate,
    order: Option<Order>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    /// A wizard on Products with an empty form, dated today (local time).
    #[must_use]
    pub fn new() -> Self {
        Self::with_today(chrono::Local::now().date_naive())
    }

    /// A wizard whose date rules use `today`.
    #[must_use]
    pub fn with_today(today: NaiveDate) -> Self {
        Self {
            current: Step::Products,
            visited: BTreeSet::from([Step::Products]),
            form: OrderForm::default(),
            errors: FieldErrors::new(),
            today,
            order: None,
        }
    }

    /// Start from a pre-filled form.
    #[must_use]
    pub fn with_form(mut self, form: OrderForm) -> Self {
        self.form = form;
        self
    }

    #[must_use]
    pub const fn current(&self) -> Step {
        self.current
    }

    #[must_use]
    pub fn is_visited(&self, step: Step) -> bool {
        self.visited.contains(&step)
    }

    #[must_use]
    pub const fn form(&self) -> &OrderForm {
        &self.form
    }

    pub const fn form_mut(&mut self) -> &mut OrderForm {
        &mut self.form
    }

    /// Errors from the last blocked move or remote check.
    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub const fn errors_mut(&mut self) -> &mut FieldErrors {
        &mut self.errors
    }

    #[must_use]
    pub const fn today(&self) -> NaiveDate {
        self.today
    }

    /// The order created by a successful submission.
    #[must_use]
    pub const fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.current, Step::Confirmation)
    }

    /// Validate the current step without moving.
    #[must_use]
    pub fn current_step_errors(&self) -> FieldErrors {
        validate_step(self.current, &self.form, self.today)
    }

    /// Request a move to `target`.
    pub fn go_to(&mut self, target: Step) -> Transition {
        if target == self.current || self.is_complete() {
            return Transition::Stayed;
        }

        for guard in guards(self.current, target) {
            if let Some(errors) = self.check(guard) {
                let notification = Notification::warning(format!("Cannot continue: {guard}"));
                warn!(
                    from = %self.current,
                    to = %target,
                    ?guard,
                    fields = errors.len(),
                    "Wizard transition blocked"
                );
                self.errors = errors;
                return Transition::Blocked {
                    guard,
                    notification,
                };
            }
        }

        let from = self.current;
        self.errors = FieldErrors::new();
        self.current = target;
        self.visited.insert(target);
        debug!(%from, to = %target, "Wizard moved");
        Transition::Moved { from, to: target }
    }

    /// Move to the next step.
    pub fn advance(&mut self) -> Transition {
        match self.current.next() {
            Some(next) => self.go_to(next),
            None => Transition::Stayed,
        }
    }

    /// Move to the previous step.
    pub fn back(&mut self) -> Transition {
        match self.current.previous() {
            Some(previous) => self.go_to(previous),
            None => Transition::Stayed,
        }
    }

    /// Start a new order after Confirmation.
    pub fn restart(&mut self) {
        *self = Self::with_today(self.today);
    }

    /// Enter Confirmation with the created order and clear the form.
    pub(crate) fn complete(&mut self, order: Order) {
        self.order = Some(order);
        self.current = Step::Confirmation;
        self.visited.insert(Step::Confirmation);
        self.errors = FieldErrors::new();
        self.form.reset();
    }

    /// `None` when the guard holds, otherwise the errors to show.
    fn check(&self, guard: Guard) -> Option<FieldErrors> {
        match guard {
            Guard::HasLineItems => {
                if has_line_items(&self.form.items) {
                    None
                } else {
                    let mut errors = FieldErrors::new();
                    errors.insert("items", "add at least one product");
                    Some(errors)
                }
            }
            Guard::StepValid(step) => {
                let errors = validate_step(step, &self.form, self.today);
                (!errors.is_empty()).then_some(errors)
            }
            Guard::StepVisited(step) => {
                (!self.visited.contains(&step)).then(FieldErrors::new)
            }
            Guard::SubmissionSucceeded => self.order.is_none().then(FieldErrors::new),
        }
    }
}
