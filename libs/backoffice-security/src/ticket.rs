//! Authentication ticket model and its versioned binary encoding.
//!
//! The encoding is `[version byte] ++ postcard(ticket)`. Protection (signing)
//! of the encoded bytes is the job of the ticket data format in the gateway.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::claims::ClaimsIdentity;

/// Current binary ticket format version.
pub const TICKET_BIN_VERSION: u8 = 1;

/// Decoded contents of an authentication cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationTicket {
    identity: ClaimsIdentity,
    authentication_scheme: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    issued_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    expires_at: DateTime<Utc>,
}

impl AuthenticationTicket {
    /// Ticket issued now and valid for `lifetime`.
    #[must_use]
    pub fn new(
        identity: ClaimsIdentity,
        authentication_scheme: impl Into<String>,
        lifetime: Duration,
    ) -> Self {
        let issued_at = Utc::now();
        Self {
            identity,
            authentication_scheme: authentication_scheme.into(),
            issued_at,
            expires_at: issued_at + lifetime,
        }
    }

    /// Ticket with explicit validity bounds.
    #[must_use]
    pub fn with_validity(
        identity: ClaimsIdentity,
        authentication_scheme: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            identity,
            authentication_scheme: authentication_scheme.into(),
            issued_at,
            expires_at,
        }
    }

    #[must_use]
    pub fn identity(&self) -> &ClaimsIdentity {
        &self.identity
    }

    #[must_use]
    pub fn into_identity(self) -> ClaimsIdentity {
        self.identity
    }

    #[must_use]
    pub fn authentication_scheme(&self) -> &str {
        &self.authentication_scheme
    }

    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Error)]
pub enum TicketCodecError {
    #[error("failed to encode ticket: {0}")]
    Encode(#[source] postcard::Error),

    #[error("ticket payload is empty")]
    Empty,

    #[error(
        "unsupported ticket version {found}, expected {expected}",
        expected = TICKET_BIN_VERSION
    )]
    UnsupportedVersion { found: u8 },

    #[error("failed to decode ticket: {0}")]
    Decode(#[source] postcard::Error),
}

/// Encode a ticket into its versioned binary form.
///
/// # Errors
///
/// Returns [`TicketCodecError::Encode`] if serialization fails.
pub fn encode_ticket(ticket: &AuthenticationTicket) -> Result<Vec<u8>, TicketCodecError> {
    let mut out = vec![TICKET_BIN_VERSION];
    let body = postcard::to_allocvec(ticket).map_err(TicketCodecError::Encode)?;
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode a ticket produced by [`encode_ticket`].
///
/// # Errors
///
/// Fails on empty input, an unknown version byte or a corrupt payload.
pub fn decode_ticket(bytes: &[u8]) -> Result<AuthenticationTicket, TicketCodecError> {
    let (&version, body) = bytes.split_first().ok_or(TicketCodecError::Empty)?;
    if version != TICKET_BIN_VERSION {
        return Err(TicketCodecError::UnsupportedVersion { found: version });
    }
    postcard::from_bytes(body).map_err(TicketCodecError::Decode)
}
