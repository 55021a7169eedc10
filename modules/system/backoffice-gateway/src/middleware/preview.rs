//! Preview authentication for the public site.
//!
//! A back-office user previewing unpublished content browses the public
//! surface with their site identity. When the preview cookie is present, this
//! stage decodes the back-office auth ticket and appends the back-office
//! identity to the current principal, so preview authorization sees both.

use std::fmt;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use backoffice_security::{BackOfficeIdentity, ClaimsPrincipal, IdentityError};
use http::StatusCode;
use http::request::Parts;
use thiserror::Error;

use crate::config::PreviewConfig;
use crate::cookies::{has_cookie, read_cookie};
use crate::problem::Problem;
use crate::request_paths::RequestPathPolicy;
use crate::ticket_format::TicketDataFormat;

#[derive(Debug, Error)]
pub enum PreviewAuthError {
    #[error("cannot convert the preview ticket identity to a back-office identity: {0}")]
    UnconvertibleIdentity(#[from] IdentityError),
}

impl IntoResponse for PreviewAuthError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "preview authentication failed");
        Problem::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            "Preview authentication failed",
        )
        .into_response()
    }
}

/// What the preview stage did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewOutcome {
    /// Static asset; nothing inspected.
    ClientSideRequest,
    /// No preview cookie, no authenticated principal, or a back-office path.
    NotEligible,
    /// Eligible, but no usable auth ticket.
    NoTicket,
    /// The back-office identity was appended to the principal.
    Attached,
}

pub struct PreviewAuthentication {
    paths: RequestPathPolicy,
    preview_cookie_name: String,
    auth_cookie_name: String,
    ticket_format: Arc<dyn TicketDataFormat>,
}

impl fmt::Debug for PreviewAuthentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewAuthentication")
            .field("paths", &self.paths)
            .field("preview_cookie_name", &self.preview_cookie_name)
            .field("auth_cookie_name", &self.auth_cookie_name)
            .finish_non_exhaustive()
    }
}

impl PreviewAuthentication {
    #[must_use]
    pub fn new(
        paths: RequestPathPolicy,
        cfg: &PreviewConfig,
        ticket_format: Arc<dyn TicketDataFormat>,
    ) -> Self {
        Self {
            paths,
            preview_cookie_name: cfg.preview_cookie_name.clone(),
            auth_cookie_name: cfg.auth_cookie_name.clone(),
            ticket_format,
        }
    }

    fn is_eligible(&self, parts: &Parts) -> bool {
        has_cookie(&parts.headers, &self.preview_cookie_name)
            && parts
                .extensions
                .get::<ClaimsPrincipal>()
                .is_some_and(ClaimsPrincipal::is_authenticated)
            && !self.paths.is_back_office_request(parts.uri.path())
    }

    /// Attach the back-office identity from the auth ticket cookie to the
    /// request principal when the request is a preview request.
    ///
    /// The principal is only touched after the ticket has been decoded, so a
    /// dropped future leaves the request unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`PreviewAuthError::UnconvertibleIdentity`] when a valid ticket
    /// carries an identity that is not a back-office identity. The request must
    /// not proceed in that case.
    pub async fn apply(&self, parts: &mut Parts) -> Result<PreviewOutcome, PreviewAuthError> {
        if self.paths.is_client_side_request(parts.uri.path()) {
            return Ok(PreviewOutcome::ClientSideRequest);
        }
        if !self.is_eligible(parts) {
            return Ok(PreviewOutcome::NotEligible);
        }

        let Some(protected) = read_cookie(&parts.headers, &self.auth_cookie_name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
        else {
            return Ok(PreviewOutcome::NoTicket);
        };

        let Some(ticket) = self.ticket_format.unprotect(&protected).await else {
            tracing::debug!(path = %parts.uri.path(), "preview auth ticket could not be decoded");
            return Ok(PreviewOutcome::NoTicket);
        };

        let identity = BackOfficeIdentity::try_from(ticket.into_identity())?;
        tracing::debug!(
            user_id = identity.id(),
            path = %parts.uri.path(),
            "attaching back-office identity for preview"
        );

        match parts.extensions.get_mut::<ClaimsPrincipal>() {
            Some(principal) => {
                principal.add_identity(identity);
                Ok(PreviewOutcome::Attached)
            }
            None => Ok(PreviewOutcome::NotEligible),
        }
    }
}

/// Axum middleware running [`PreviewAuthentication::apply`] before the next
/// stage.
pub async fn preview_auth_middleware(
    State(preview): State<Arc<PreviewAuthentication>>,
    req: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();
    match preview.apply(&mut parts).await {
        Ok(_) => next.run(Request::from_parts(parts, body)).await,
        Err(err) => err.into_response(),
    }
}
