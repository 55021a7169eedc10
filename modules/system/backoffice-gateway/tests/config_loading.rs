#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Loading gateway configuration from YAML.

use std::io::Write;

use backoffice_gateway::{BackOfficeGateway, BackOfficeGatewayConfig};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

fn yaml_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn yaml_values_override_defaults() {
    let key = STANDARD.encode([42u8; 32]);
    let file = yaml_file(&format!(
        "antiforgery:\n  cookie_name: XSRF-A\n  secure_cookie: false\n\
         preview:\n  preview_cookie_name: PREVIEW\n\
         paths:\n  backoffice_path: /admin\n\
         signing_key: {key}\n"
    ));

    let cfg = BackOfficeGatewayConfig::load(Some(file.path())).unwrap();

    assert_eq!(cfg.antiforgery.cookie_name, "XSRF-A");
    assert!(!cfg.antiforgery.secure_cookie);
    assert_eq!(cfg.antiforgery.header_name, "X-BO-XSRF-TOKEN");
    assert_eq!(cfg.preview.preview_cookie_name, "PREVIEW");
    assert_eq!(cfg.preview.auth_cookie_name, "BO_UCONTEXT");

    let gateway = BackOfficeGateway::from_config(&cfg).unwrap();
    assert!(gateway.paths().is_back_office_request("/admin/users"));
    assert!(!gateway.paths().is_back_office_request("/backoffice"));
}

#[test]
fn unknown_keys_are_rejected() {
    let file = yaml_file("preview:\n  cookie: BO\n");

    assert!(BackOfficeGatewayConfig::load(Some(file.path())).is_err());
}

#[test]
fn invalid_signing_key_fails_gateway_construction() {
    let file = yaml_file("signing_key: \"not base64!\"\n");
    let cfg = BackOfficeGatewayConfig::load(Some(file.path())).unwrap();

    assert!(BackOfficeGateway::from_config(&cfg).is_err());
}
