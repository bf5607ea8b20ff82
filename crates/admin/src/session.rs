//! Panel session and sign-in/sign-out propagation.
//!
//! A [`Session`] is an explicit value handed to the API client; nothing reads
//! the token from ambient state. [`SessionHub`] fans session changes out to
//! every subscriber in the process, so a 401 seen by one client signs out all
//! of them.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::broadcast;

use vitrine_core::UserId;

use crate::api::CurrentUser;

const HUB_CAPACITY: usize = 16;

/// Errors raised while building or checking a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The token is not a three-part JWT with a JSON payload.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// The token's `exp` claim is in the past.
    #[error("Session expired at {0}")]
    Expired(DateTime<Utc>),
}

/// An authenticated panel session.
#[derive(Clone)]
pub struct Session {
    token: SecretString,
    user: CurrentUser,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Build a session from a JWT and the user it belongs to.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::MalformedToken` if the payload cannot be decoded.
    pub fn new(token: SecretString, user: CurrentUser) -> Result<Self, SessionError> {
        let expires_at = decode_expiry(token.expose_secret())?;
        Ok(Self {
            token,
            user,
            expires_at,
        })
    }

    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub const fn user(&self) -> &CurrentUser {
        &self.user
    }

    /// Expiry from the `exp` claim; `None` when the token carries none.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// Fail if the session is expired at `now`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Expired` with the expiry instant.
    pub fn ensure_active(&self, now: DateTime<Utc>) -> Result<(), SessionError> {
        match self.expires_at {
            Some(exp) if exp <= now => Err(SessionError::Expired(exp)),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("user", &self.user.id)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<i64>,
}

/// Read the `exp` claim of a JWT without verifying its signature.
///
/// The API is the authority on validity; the panel only needs to know when to
/// stop sending the token.
///
/// # Errors
///
/// Returns `SessionError::MalformedToken` if the token is not `a.b.c` or the
/// payload is not base64url JSON.
pub fn decode_expiry(token: &str) -> Result<Option<DateTime<Utc>>, SessionError> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => {
            return Err(SessionError::MalformedToken(
                "expected three dot-separated parts".to_string(),
            ));
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| SessionError::MalformedToken(e.to_string()))?;
    let claims: Claims =
        serde_json::from_slice(&bytes).map_err(|e| SessionError::MalformedToken(e.to_string()))?;

    Ok(claims
        .exp
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)))
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    UserRequested,
    /// The API answered 401.
    Unauthorized,
    Expired,
}

/// A session change broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { user_id: UserId },
    SignedOut { reason: SignOutReason },
}

/// Broadcasts session changes to every subscriber.
#[derive(Debug, Clone)]
pub struct SessionHub {
    sender: broadcast::Sender<SessionEvent>,
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHub {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(HUB_CAPACITY);
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub fn signed_in(&self, user: &CurrentUser) {
        tracing::info!(user_id = %user.id, "Signed in");
        self.publish(SessionEvent::SignedIn {
            user_id: user.id.clone(),
        });
    }

    pub fn signed_out(&self, reason: SignOutReason) {
        tracing::info!(?reason, "Signed out");
        self.publish(SessionEvent::SignedOut { reason });
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }
}
