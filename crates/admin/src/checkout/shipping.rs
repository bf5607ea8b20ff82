//! Shipping quotes and free-rate auto-selection.

use tracing::{debug, instrument};

use vitrine_core::PostalCode;

use super::form::LineItemInput;
use crate::api::{ApiError, CommerceApi, ShippingItem, ShippingQuote, ShippingQuoteRequest};

/// Quotes for a postal code and the auto-selected free quote, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingQuotes {
    pub quotes: Vec<ShippingQuote>,
    pub selected: Option<ShippingQuote>,
}

/// Rows that ship physically: digital items and incomplete rows are left out.
#[must_use]
pub fn physical_items(items: &[LineItemInput]) -> Vec<ShippingItem> {
    items
        .iter()
        .filter(|item| !item.digital && item.quantity >= 1)
        .filter_map(|item| {
            item.product_id.as_ref().map(|product_id| ShippingItem {
                product_id: product_id.clone(),
                variant_id: item.variant_id.clone(),
                quantity: item.quantity,
            })
        })
        .collect()
}

/// The cheapest quote, but only when it is free.
///
/// Ties go to the first quote in the list.
#[must_use]
pub fn select_free_quote(quotes: &[ShippingQuote]) -> Option<&ShippingQuote> {
    quotes
        .iter()
        .min_by_key(|quote| quote.price)
        .filter(|quote| quote.price.is_free())
}

/// Request quotes for the physical items and pick a free one.
///
/// Makes no request when nothing ships physically.
///
/// # Errors
///
/// Returns error if the quote request fails.
#[instrument(skip(api, items), fields(cep = %postal_code))]
pub async fn quote<A: CommerceApi + ?Sized>(
    api: &A,
    provider: &str,
    postal_code: &PostalCode,
    items: &[LineItemInput],
) -> Result<ShippingQuotes, ApiError> {
    let items = physical_items(items);
    if items.is_empty() {
        debug!("No physical items, skipping shipping quote");
        return Ok(ShippingQuotes::default());
    }

    let request = ShippingQuoteRequest {
        postal_code: postal_code.clone(),
        items,
    };
    let quotes = api.shipping_quotes(provider, &request).await?;
    let selected = select_free_quote(&quotes).cloned();
    if let Some(quote) = &selected {
        debug!(quote_id = %quote.id, service = %quote.service, "Free shipping auto-selected");
    }

    Ok(ShippingQuotes { quotes, selected })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vitrine_core::{Price, ProductId};

    use super::*;

    fn quote(id: &str, cents: i64) -> ShippingQuote {
        ShippingQuote {
            id: id.to_string(),
            service: id.to_uppercase(),
            price: Price::from_cents(cents),
            delivery_days: None,
        }
    }

    #[test]
    fn test_free_quote_selected() {
        let quotes = [quote("free", 0), quote("pac", 1200)];
        assert_eq!(select_free_quote(&quotes).unwrap().id, "free");
    }

    #[test]
    fn test_nothing_selected_when_all_paid() {
        let quotes = [quote("pac", 1200), quote("sedex", 2590)];
        assert!(select_free_quote(&quotes).is_none());
        assert!(select_free_quote(&[]).is_none());
    }

    #[test]
    fn test_tie_goes_to_first() {
        let quotes = [quote("pac", 1200), quote("a", 0), quote("b", 0)];
        assert_eq!(select_free_quote(&quotes).unwrap().id, "a");
    }

    #[test]
    fn test_physical_items_excludes_digital() {
        let items = [
            LineItemInput {
                product_id: Some(ProductId::new("shirt")),
                quantity: 2,
                ..LineItemInput::default()
            },
            LineItemInput {
                product_id: Some(ProductId::new("esim")),
                digital: true,
                ..LineItemInput::default()
            },
            LineItemInput::default(),
        ];
        let physical = physical_items(&items);
        assert_eq!(physical.len(), 1);
        assert_eq!(physical[0].product_id, ProductId::new("shirt"));
        assert_eq!(physical[0].quantity, 2);
    }
}
