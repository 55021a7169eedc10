#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Back-office request pipeline: anti-forgery tokens and preview
//! authentication for axum services.

pub mod antiforgery;
pub mod config;
pub mod cookies;
pub mod gateway;
pub mod middleware;
pub mod problem;
pub mod request_paths;
pub mod signing;
pub mod ticket_format;

pub use antiforgery::{AntiforgeryError, AntiforgeryTokenSet, BackOfficeAntiforgery};
pub use config::BackOfficeGatewayConfig;
pub use gateway::BackOfficeGateway;
pub use middleware::antiforgery::antiforgery_middleware;
pub use middleware::preview::{
    PreviewAuthError, PreviewAuthentication, PreviewOutcome, preview_auth_middleware,
};
pub use problem::Problem;
pub use request_paths::RequestPathPolicy;
pub use signing::SigningKey;
pub use ticket_format::{SignedTicketDataFormat, TicketDataFormat, TicketProtectError};
