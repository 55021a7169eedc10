//! Anti-forgery enforcement for state-changing back-office requests.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::{Method, StatusCode};

use crate::antiforgery::BackOfficeAntiforgery;
use crate::problem::Problem;
use crate::request_paths::RequestPathPolicy;

/// State for [`antiforgery_middleware`].
#[derive(Debug, Clone)]
pub struct AntiforgeryState {
    pub antiforgery: Arc<BackOfficeAntiforgery>,
    pub paths: RequestPathPolicy,
}

fn is_state_changing(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Reject state-changing back-office requests without a valid token pair.
///
/// Safe methods and requests outside the back-office path pass through.
pub async fn antiforgery_middleware(
    State(state): State<AntiforgeryState>,
    req: Request,
    next: Next,
) -> Response {
    if !is_state_changing(req.method()) || !state.paths.is_back_office_request(req.uri().path()) {
        return next.run(req).await;
    }

    let (parts, body) = req.into_parts();
    if let Err(err) = state.antiforgery.validate_request(&parts) {
        tracing::debug!(
            method = %parts.method,
            path = %parts.uri.path(),
            "anti-forgery validation failed: {err}"
        );
        return Problem::new(
            StatusCode::FORBIDDEN,
            "Forbidden",
            "Missing or invalid anti-forgery token",
        )
        .into_response();
    }

    next.run(Request::from_parts(parts, body)).await
}
