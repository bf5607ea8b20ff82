//! Wizard steps and the guards on moving between them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A page of the checkout wizard, numbered 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Products = 1,
    Identification = 2,
    Shipping = 3,
    Payment = 4,
    Confirmation = 5,
}

impl Step {
    pub const ALL: [Self; 5] = [
        Self::Products,
        Self::Identification,
        Self::Shipping,
        Self::Payment,
        Self::Confirmation,
    ];

    /// 1-based position.
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Products),
            2 => Some(Self::Identification),
            3 => Some(Self::Shipping),
            4 => Some(Self::Payment),
            5 => Some(Self::Confirmation),
            _ => None,
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        Self::from_number(self.number().saturating_sub(1))
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Products => "Products",
            Self::Identification => "Identification",
            Self::Shipping => "Shipping",
            Self::Payment => "Payment",
            Self::Confirmation => "Confirmation",
        }
    }

    /// Steps strictly between `self` and `to`, plus `self`, in order.
    fn forward_span(self, to: Self) -> impl Iterator<Item = Self> {
        Self::ALL
            .into_iter()
            .filter(move |s| *s >= self && *s < to)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.number())
    }
}

/// A named condition a transition must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// At least one line item with a product and quantity >= 1.
    HasLineItems,
    /// The step's fields validate.
    StepValid(Step),
    /// The target was reached before (required for jumps past the next step).
    StepVisited(Step),
    /// Confirmation is only entered by a successful submission.
    SubmissionSucceeded,
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HasLineItems => write!(f, "add at least one product"),
            Self::StepValid(step) => write!(f, "fix the errors on {}", step.label()),
            Self::StepVisited(step) => write!(f, "complete the steps before {}", step.label()),
            Self::SubmissionSucceeded => write!(f, "submit the order first"),
        }
    }
}

/// Guards to check, in order, for moving `from` -> `to`.
///
/// Backward moves and staying put have none.
#[must_use]
pub fn guards(from: Step, to: Step) -> Vec<Guard> {
    if to <= from {
        return Vec::new();
    }
    if to == Step::Confirmation {
        return vec![Guard::SubmissionSucceeded];
    }

    let mut guards = Vec::new();
    if to.number() > from.number() + 1 {
        guards.push(Guard::StepVisited(to));
    }
    for step in from.forward_span(to) {
        if step == Step::Products {
            guards.push(Guard::HasLineItems);
        }
        guards.push(Guard::StepValid(step));
    }
    guards
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbering() {
        for (i, step) in Step::ALL.iter().enumerate() {
            assert_eq!(usize::from(step.number()), i + 1);
            assert_eq!(Step::from_number(step.number()), Some(*step));
        }
        assert_eq!(Step::from_number(0), None);
        assert_eq!(Step::from_number(6), None);
    }

    #[test]
    fn test_next_and_previous() {
        assert_eq!(Step::Products.next(), Some(Step::Identification));
        assert_eq!(Step::Confirmation.next(), None);
        assert_eq!(Step::Products.previous(), None);
        assert_eq!(Step::Payment.previous(), Some(Step::Shipping));
    }

    #[test]
    fn test_backward_is_unguarded() {
        assert!(guards(Step::Payment, Step::Products).is_empty());
        assert!(guards(Step::Shipping, Step::Shipping).is_empty());
    }

    #[test]
    fn test_products_forward_guards() {
        assert_eq!(
            guards(Step::Products, Step::Identification),
            vec![Guard::HasLineItems, Guard::StepValid(Step::Products)]
        );
    }

    #[test]
    fn test_jump_requires_visit_and_every_step_between() {
        assert_eq!(
            guards(Step::Identification, Step::Payment),
            vec![
                Guard::StepVisited(Step::Payment),
                Guard::StepValid(Step::Identification),
                Guard::StepValid(Step::Shipping),
            ]
        );
    }

    #[test]
    fn test_confirmation_needs_submission() {
        assert_eq!(
            guards(Step::Payment, Step::Confirmation),
            vec![Guard::SubmissionSucceeded]
        );
        assert_eq!(
            guards(Step::Products, Step::Confirmation),
            vec![Guard::SubmissionSucceeded]
        );
    }
}
