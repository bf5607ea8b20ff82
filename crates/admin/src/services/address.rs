//! CEP address autofill.

use std::time::Duration;

use tracing::{debug, instrument};

use vitrine_core::{PostalCode, digits_only};

use super::debounce::{Debounced, Debouncer};
use crate::api::{AddressLookup, ApiError, CommerceApi};
use crate::checkout::AddressInput;

const CEP_DIGITS: usize = 8;

/// Debounced CEP lookup for one address form.
#[derive(Debug, Clone)]
pub struct AddressAutofill<A> {
    api: A,
    debouncer: Debouncer,
}

impl<A: CommerceApi> AddressAutofill<A> {
    #[must_use]
    pub fn new(api: A, delay: Duration) -> Self {
        Self {
            api,
            debouncer: Debouncer::new(delay),
        }
    }

    /// Look up a CEP as typed.
    ///
    /// Incomplete input and unknown CEPs resolve to `Ready(None)` without
    /// failing; only transport and server errors are returned as `Err`.
    ///
    /// # Errors
    ///
    /// Returns error if the lookup request fails.
    #[instrument(skip(self))]
    pub async fn lookup(&self, input: &str) -> Result<Debounced<Option<AddressLookup>>, ApiError> {
        let parsed = (digits_only(input).len() == CEP_DIGITS)
            .then(|| PostalCode::parse(input).ok())
            .flatten();
        let Some(cep) = parsed else {
            self.debouncer.supersede();
            return Ok(Debounced::Ready(None));
        };

        match self.debouncer.run(|| self.api.lookup_address(&cep)).await {
            Debounced::Superseded => Ok(Debounced::Superseded),
            Debounced::Ready(Ok(address)) => Ok(Debounced::Ready(Some(address))),
            Debounced::Ready(Err(ApiError::NotFound(_))) => {
                debug!(cep = %cep, "CEP not found");
                Ok(Debounced::Ready(None))
            }
            Debounced::Ready(Err(e)) => Err(e),
        }
    }
}

/// Copy a looked-up address into the form.
///
/// Street, neighborhood, city and state are replaced; number and complement
/// are the operator's and stay untouched. Blank lookup fields never erase
/// what was typed.
pub fn apply_lookup(lookup: &AddressLookup, address: &mut AddressInput) {
    address.postal_code = lookup.postal_code.masked();
    let fields = [
        (&lookup.street, &mut address.street),
        (&lookup.neighborhood, &mut address.neighborhood),
        (&lookup.city, &mut address.city),
        (&lookup.state, &mut address.state),
    ];
    for (value, target) in fields {
        if !value.trim().is_empty() {
            value.trim().clone_into(target);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::FakeApi;

    const DELAY: Duration = Duration::from_millis(500);

    fn lookup() -> AddressLookup {
        AddressLookup {
            postal_code: PostalCode::parse("29100000").unwrap(),
            street: "Av. Champagnat".to_string(),
            neighborhood: String::new(),
            city: "Vila Velha".to_string(),
            state: "ES".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_incomplete_cep_makes_no_request() {
        let api = FakeApi::default();
        let autofill = AddressAutofill::new(api.clone(), DELAY);
        assert_eq!(autofill.lookup("29100-0").await.unwrap(), Debounced::Ready(None));
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_found_and_not_found() {
        let found = AddressAutofill::new(
            FakeApi {
                address: Some(lookup()),
                ..FakeApi::default()
            },
            DELAY,
        );
        let result = found.lookup("29100-000").await.unwrap().ready().unwrap();
        assert_eq!(result.unwrap().city, "Vila Velha");

        let missing = AddressAutofill::new(FakeApi::default(), DELAY);
        assert_eq!(
            missing.lookup("99999-999").await.unwrap(),
            Debounced::Ready(None)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_edit_supersedes_pending_lookup() {
        let api = FakeApi {
            address: Some(lookup()),
            ..FakeApi::default()
        };
        let autofill = AddressAutofill::new(api.clone(), DELAY);

        let early = {
            let autofill = autofill.clone();
            tokio::spawn(async move { autofill.lookup("29100-000").await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        let latest = autofill.lookup("29100-00").await.unwrap();

        assert_eq!(latest, Debounced::Ready(None));
        assert!(early.await.unwrap().unwrap().is_superseded());
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_apply_lookup_keeps_operator_fields() {
        let mut address = AddressInput {
            number: "100".to_string(),
            complement: "apto 2".to_string(),
            neighborhood: "Praia da Costa".to_string(),
            ..AddressInput::default()
        };
        apply_lookup(&lookup(), &mut address);

        assert_eq!(address.postal_code, "29100-000");
        assert_eq!(address.street, "Av. Champagnat");
        assert_eq!(address.city, "Vila Velha");
        assert_eq!(address.number, "100");
        assert_eq!(address.complement, "apto 2");
        assert_eq!(address.neighborhood, "Praia da Costa");
    }
}
