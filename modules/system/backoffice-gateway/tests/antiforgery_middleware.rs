#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Enforcement of anti-forgery tokens on state-changing back-office requests.

use axum::Router;
use axum::body::Body;
use axum::extract::Request;
use axum::middleware::{Next, from_fn};
use axum::response::Response;
use axum::routing::{get, post};
use backoffice_gateway::{AntiforgeryTokenSet, BackOfficeGateway, BackOfficeGatewayConfig};
use backoffice_security::{BackOfficeIdentity, ClaimsPrincipal};
use http::{HeaderMap, Method, StatusCode, header};
use tower::ServiceExt;

fn editor() -> ClaimsPrincipal {
    ClaimsPrincipal::new(BackOfficeIdentity::builder(5, "editor").build().unwrap())
}

async fn back_office_auth(mut req: Request, next: Next) -> Response {
    req.extensions_mut().insert(editor());
    next.run(req).await
}

fn app(gateway: &BackOfficeGateway) -> Router {
    let routes = Router::new()
        .route(
            "/backoffice/api/content",
            get(|| async { "list" }).post(|| async { "saved" }),
        )
        .route("/contact", post(|| async { "sent" }));
    gateway
        .apply_middleware(routes)
        .layer(from_fn(back_office_auth))
}

fn issue(gateway: &BackOfficeGateway) -> AntiforgeryTokenSet {
    let (mut parts, ()) = http::Request::builder()
        .uri("/backoffice/api/login")
        .extension(editor())
        .body(())
        .unwrap()
        .into_parts();
    gateway
        .antiforgery()
        .get_and_store_tokens(&mut parts, &mut HeaderMap::new())
        .unwrap()
}

fn request(method: Method, uri: &str, tokens: Option<&AntiforgeryTokenSet>) -> Request {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(tokens) = tokens {
        builder = builder
            .header(header::COOKIE, format!("BO-XSRF-V={}", tokens.cookie_token))
            .header("X-BO-XSRF-TOKEN", tokens.header_token.as_str());
    }
    builder.body(Body::empty()).unwrap()
}

fn gateway() -> BackOfficeGateway {
    BackOfficeGateway::from_config(&BackOfficeGatewayConfig::default()).unwrap()
}

#[tokio::test]
async fn post_without_tokens_is_forbidden() {
    let gateway = gateway();

    let response = app(&gateway)
        .oneshot(request(Method::POST, "/backoffice/api/content", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
}

#[tokio::test]
async fn post_with_valid_tokens_reaches_handler() {
    let gateway = gateway();
    let tokens = issue(&gateway);

    let response = app(&gateway)
        .oneshot(request(Method::POST, "/backoffice/api/content", Some(&tokens)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn safe_methods_and_public_paths_are_not_checked() {
    let gateway = gateway();

    let response = app(&gateway)
        .oneshot(request(Method::GET, "/backoffice/api/content", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(&gateway)
        .oneshot(request(Method::POST, "/contact", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
