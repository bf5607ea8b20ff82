//! One-shot lookups: shipping quotes, CEP autofill and uniqueness checks.

use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use vitrine_admin::checkout::{AddressInput, FieldErrors, quote_shipping};
use vitrine_admin::services::{AddressAutofill, Debounced, UniquenessChecker, apply_lookup};
use vitrine_admin::{AdminConfig, AppError};
use vitrine_core::PostalCode;

use super::{Draft, connect, print_line, read_yaml};

/// A command runs once, so nothing is left to debounce.
const NO_DELAY: Duration = Duration::ZERO;

/// Kind of value checked by `vitrine slug`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SlugResource {
    /// Product slug
    Product,
    /// Coupon code
    Coupon,
}

/// Quote shipping for the draft's physical items.
pub async fn shipping(config: &AdminConfig, cep: &str, path: &Path) -> Result<(), AppError> {
    let postal_code = PostalCode::parse(cep).map_err(|e| AppError::Validation(e.to_string()))?;
    let draft: Draft = read_yaml(path)?;
    let client = connect(config).await?;

    let quotes = quote_shipping(
        &client,
        client.shipping_provider(),
        &postal_code,
        &draft.form.items,
    )
    .await?;

    if quotes.quotes.is_empty() {
        print_line("Nothing to ship");
        return Ok(());
    }
    for quote in &quotes.quotes {
        let days = quote
            .delivery_days
            .map_or_else(String::new, |d| format!(" ({d} days)"));
        print_line(&format!("{:<24} {}{days}", quote.service, quote.price));
    }
    match &quotes.selected {
        Some(quote) => print_line(&format!("Free option: {}", quote.service)),
        None => print_line("No free option"),
    }
    Ok(())
}

/// Look up an address by CEP and print it as it would fill the form.
pub async fn address(config: &AdminConfig, cep: &str) -> Result<(), AppError> {
    let client = connect(config).await?;
    let autofill = AddressAutofill::new(client, NO_DELAY);

    let Debounced::Ready(lookup) = autofill.lookup(cep).await? else {
        return Ok(());
    };
    let Some(lookup) = lookup else {
        return Err(AppError::Validation(format!("CEP not found: {cep}")));
    };

    let mut address = AddressInput::default();
    apply_lookup(&lookup, &mut address);
    let yaml = serde_yaml::to_string(&address).map_err(|e| AppError::Input(e.to_string()))?;
    print_line(yaml.trim_end());
    Ok(())
}

/// Check that a product slug or coupon code is well-formed and unused.
pub async fn slug(config: &AdminConfig, resource: SlugResource, value: &str) -> Result<(), AppError> {
    let client = connect(config).await?;
    let checker = UniquenessChecker::new(client, NO_DELAY);

    let result = match resource {
        SlugResource::Product => checker.product_slug(value).await?,
        SlugResource::Coupon => checker.coupon_code(value, None).await?,
    };
    let errors = result.ready().unwrap_or_else(FieldErrors::new);

    if errors.is_empty() {
        print_line(&format!("{value} is available"));
        Ok(())
    } else {
        Err(AppError::Validation(errors.to_string()))
    }
}
