//! Protection of authentication tickets carried in cookies.

use std::sync::Arc;

use async_trait::async_trait;
use backoffice_security::{AuthenticationTicket, TicketCodecError, decode_ticket, encode_ticket};
use chrono::Utc;
use thiserror::Error;

use crate::signing::SigningKey;

const TICKET_PURPOSE: &str = "backoffice.auth-ticket.v1";

#[derive(Debug, Error)]
pub enum TicketProtectError {
    #[error(transparent)]
    Codec(#[from] TicketCodecError),

    #[error("signing key is unusable")]
    Signing,
}

/// Turns a protected cookie value back into an authentication ticket.
///
/// `None` means "no usable ticket": bad encoding, bad signature, unknown
/// format version or an expired ticket all collapse into it.
#[async_trait]
pub trait TicketDataFormat: Send + Sync {
    async fn unprotect(&self, protected: &str) -> Option<AuthenticationTicket>;
}

/// HMAC-signed ticket format backed by the process signing key.
#[derive(Debug, Clone)]
pub struct SignedTicketDataFormat {
    key: Arc<SigningKey>,
}

impl SignedTicketDataFormat {
    #[must_use]
    pub fn new(key: Arc<SigningKey>) -> Self {
        Self { key }
    }

    /// Protect a ticket for storage in a cookie.
    ///
    /// # Errors
    ///
    /// Returns an error if the ticket cannot be encoded or the key cannot sign.
    pub fn protect(&self, ticket: &AuthenticationTicket) -> Result<String, TicketProtectError> {
        let payload = encode_ticket(ticket)?;
        self.key
            .seal(TICKET_PURPOSE, &payload)
            .ok_or(TicketProtectError::Signing)
    }

    fn unprotect_now(&self, protected: &str) -> Option<AuthenticationTicket> {
        let Some(payload) = self.key.open(TICKET_PURPOSE, protected) else {
            tracing::debug!("auth ticket rejected: bad encoding or signature");
            return None;
        };
        let ticket = match decode_ticket(&payload) {
            Ok(ticket) => ticket,
            Err(err) => {
                tracing::debug!("auth ticket rejected: {err}");
                return None;
            }
        };
        if ticket.is_expired_at(Utc::now()) {
            tracing::debug!(expires_at = %ticket.expires_at(), "auth ticket rejected: expired");
            return None;
        }
        Some(ticket)
    }
}

#[async_trait]
impl TicketDataFormat for SignedTicketDataFormat {
    async fn unprotect(&self, protected: &str) -> Option<AuthenticationTicket> {
        self.unprotect_now(protected)
    }
}
