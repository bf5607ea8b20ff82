//! CLI command implementations.
//!
//! Every command that talks to the API goes through [`connect`], which
//! establishes a session from `VITRINE_API_TOKEN` or, failing that, from the
//! panel credentials.

pub mod checkout;
pub mod coupon;
pub mod lookup;

use std::path::Path;

use chrono::Utc;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::info;
use vitrine_admin::checkout::OrderForm;
use vitrine_admin::error::set_sentry_user;
use vitrine_admin::session::SignOutReason;
use vitrine_admin::{AdminConfig, AppError, CommerceClient, Session, SessionHub};
use vitrine_core::CartId;

/// An order drafted in YAML: the wizard form, optionally bound to a cart.
#[derive(Debug, Default, Deserialize)]
pub struct Draft {
    /// Existing cart to resume instead of opening a new one
    #[serde(default)]
    pub cart_id: Option<CartId>,
    #[serde(flatten)]
    pub form: OrderForm,
}

/// Read and parse a YAML file.
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Input(format!("{}: {e}", path.display())))?;
    parse_yaml(&contents).map_err(|e| AppError::Input(format!("{}: {e}", path.display())))
}

fn parse_yaml<T: DeserializeOwned>(contents: &str) -> Result<T, serde_yaml::Error> {
    serde_yaml::from_str(contents)
}

#[allow(clippy::print_stdout)]
pub fn print_line(line: &str) {
    println!("{line}");
}

/// Establish a session and return a client bound to it.
pub async fn connect(config: &AdminConfig) -> Result<CommerceClient, AppError> {
    let hub = SessionHub::new();

    let session = if let Some(token) = &config.api_token {
        let probe = CommerceClient::authenticated(&config.api, token, None)?;
        let user = probe.me().await?;
        Session::new(token.clone(), user)?
    } else if let Some(credentials) = &config.credentials {
        let anonymous = CommerceClient::new(&config.api)?;
        anonymous
            .login(&credentials.email, &credentials.password)
            .await?
    } else {
        return Err(AppError::Validation(
            "set VITRINE_API_TOKEN, or VITRINE_API_EMAIL and VITRINE_API_PASSWORD".to_string(),
        ));
    };

    if let Err(e) = session.ensure_active(Utc::now()) {
        hub.signed_out(SignOutReason::Expired);
        return Err(e.into());
    }

    set_sentry_user(session.user());
    info!(user_id = %session.user().id, role = %session.user().role, "Signed in");
    hub.signed_in(session.user());

    Ok(CommerceClient::with_session(&config.api, &session, hub)?)
}
