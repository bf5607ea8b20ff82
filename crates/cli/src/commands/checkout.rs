//! Checkout over a YAML draft.
//!
//! # Usage
//!
//! ```bash
//! vitrine checkout order.yaml --dry-run
//! vitrine checkout order.yaml
//! ```
//!
//! The draft is loaded into a fresh wizard, which is advanced step by step
//! exactly as the panel would. The first blocked step stops the run and its
//! field errors are printed.

use std::path::Path;

use tracing::info;
use vitrine_admin::checkout::{FieldErrors, Step, Transition};
use vitrine_admin::{AdminConfig, AppError, Checkout, CommerceApi, Wizard};
use vitrine_core::CartId;

use super::{Draft, connect, print_line, read_yaml};

/// Placeholder cart for dry runs, which never touch the server cart.
const DRY_RUN_CART: &str = "dry-run";

/// Run the checkout wizard over the draft at `path`.
pub async fn run(config: &AdminConfig, path: &Path, dry_run: bool) -> Result<(), AppError> {
    let draft: Draft = read_yaml(path)?;
    let client = connect(config).await?;
    let provider = client.shipping_provider().to_owned();
    let wizard = Wizard::new().with_form(draft.form);

    let mut checkout = match draft.cart_id {
        Some(cart_id) => Checkout::resume(client, cart_id, provider, wizard),
        None if dry_run => Checkout::resume(client, CartId::new(DRY_RUN_CART), provider, wizard),
        None => Checkout::open(client, provider, wizard).await?,
    };

    let form = checkout.wizard().form();
    if form.shipping_option.is_none() && form.has_physical_items() {
        let quotes = checkout.quote_shipping().await?;
        match &quotes.selected {
            Some(quote) => print_line(&format!("Free shipping selected: {}", quote.service)),
            None => print_line(&format!(
                "{} shipping quotes, none free; choose one in the draft",
                quotes.quotes.len()
            )),
        }
    }

    walk_to_payment(&mut checkout)?;

    if dry_run {
        print_line("Draft is valid through Payment; dry run, nothing submitted");
        return Ok(());
    }

    let order = checkout.submit().await.inspect_err(|e| {
        print_line(&e.notification().message);
    })?;
    info!(order_id = %order.id, "Checkout finished");

    print_line(&format!("Order {} created", order.id));
    print_line(&format!("  Status:  {:?}", order.status));
    print_line(&format!("  Payment: {:?}", order.payment_status));
    if let Some(total) = order.total {
        print_line(&format!("  Total:   {total}"));
    }
    if let Some(pix) = &order.pix {
        print_line(&format!("  Pix:     {}", pix.qr_code));
        if let Some(expires_at) = pix.expires_at {
            print_line(&format!("  Expires: {expires_at}"));
        }
    }
    Ok(())
}

/// Advance until Payment, stopping at the first blocked step.
fn walk_to_payment<A: CommerceApi>(checkout: &mut Checkout<A>) -> Result<(), AppError> {
    while checkout.wizard().current() < Step::Payment {
        match checkout.wizard_mut().advance() {
            Transition::Moved { to, .. } => print_line(&format!("-> {to}")),
            Transition::Stayed => break,
            Transition::Blocked { notification, .. } => {
                print_errors(checkout.wizard().errors());
                return Err(AppError::Validation(notification.message));
            }
        }
    }
    Ok(())
}

fn print_errors(errors: &FieldErrors) {
    for (field, message) in errors.iter() {
        print_line(&format!("  {field}: {message}"));
    }
}
