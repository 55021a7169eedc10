//! Wiring of the back-office stages onto an axum router.

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;

use crate::antiforgery::BackOfficeAntiforgery;
use crate::config::BackOfficeGatewayConfig;
use crate::middleware::antiforgery::{AntiforgeryState, antiforgery_middleware};
use crate::middleware::preview::{PreviewAuthentication, preview_auth_middleware};
use crate::request_paths::RequestPathPolicy;
use crate::ticket_format::SignedTicketDataFormat;

/// Shared, read-only state of the back-office request pipeline.
///
/// Both the ticket format and the anti-forgery guard sign with the same key.
#[derive(Debug, Clone)]
pub struct BackOfficeGateway {
    paths: RequestPathPolicy,
    antiforgery: Arc<BackOfficeAntiforgery>,
    ticket_format: Arc<SignedTicketDataFormat>,
    preview: Arc<PreviewAuthentication>,
}

impl BackOfficeGateway {
    /// Build the pipeline from configuration.
    ///
    /// # Errors
    ///
    /// Fails if the configured signing key is invalid.
    pub fn from_config(cfg: &BackOfficeGatewayConfig) -> anyhow::Result<Self> {
        let key = Arc::new(cfg.signing_key()?);
        let paths = RequestPathPolicy::from_config(&cfg.paths);
        let ticket_format = Arc::new(SignedTicketDataFormat::new(Arc::clone(&key)));
        let antiforgery = Arc::new(BackOfficeAntiforgery::new(key, cfg.antiforgery.clone()));
        let preview = Arc::new(PreviewAuthentication::new(
            paths.clone(),
            &cfg.preview,
            ticket_format.clone(),
        ));

        tracing::info!(
            backoffice_path = %cfg.paths.backoffice_path,
            preview_cookie = %cfg.preview.preview_cookie_name,
            "back-office gateway initialized"
        );

        Ok(Self {
            paths,
            antiforgery,
            ticket_format,
            preview,
        })
    }

    #[must_use]
    pub fn antiforgery(&self) -> &Arc<BackOfficeAntiforgery> {
        &self.antiforgery
    }

    /// Ticket format used to protect auth cookies after a real login.
    #[must_use]
    pub fn ticket_format(&self) -> &Arc<SignedTicketDataFormat> {
        &self.ticket_format
    }

    #[must_use]
    pub fn preview(&self) -> &Arc<PreviewAuthentication> {
        &self.preview
    }

    #[must_use]
    pub fn paths(&self) -> &RequestPathPolicy {
        &self.paths
    }

    /// Layer the back-office stages onto `router`.
    ///
    /// The site authentication layer that inserts the request's
    /// `ClaimsPrincipal` must wrap the returned router.
    #[must_use]
    pub fn apply_middleware(&self, router: Router) -> Router {
        // Layers are applied inner to outer.

        // 2) Anti-forgery (sees the principal after preview augmentation)
        let router = router.layer(from_fn_with_state(
            AntiforgeryState {
                antiforgery: Arc::clone(&self.antiforgery),
                paths: self.paths.clone(),
            },
            antiforgery_middleware,
        ));

        // 1) Preview identity merge
        router.layer(from_fn_with_state(
            Arc::clone(&self.preview),
            preview_auth_middleware,
        ))
    }
}
