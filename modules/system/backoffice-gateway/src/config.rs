use std::path::Path;

use anyhow::{Context, bail};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::signing::{MIN_KEY_LEN, SigningKey};

/// Environment variable prefix; nested keys are separated by `__`,
/// e.g. `BACKOFFICE__PREVIEW__PREVIEW_COOKIE_NAME`.
pub const ENV_PREFIX: &str = "BACKOFFICE__";

/// Back-office gateway configuration.
///
/// Loaded once at start-up and shared read-only afterwards.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct BackOfficeGatewayConfig {
    #[serde(default)]
    pub antiforgery: AntiforgeryConfig,

    #[serde(default)]
    pub preview: PreviewConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    /// Base64 HMAC key shared by the ticket format and the anti-forgery guard.
    /// When absent a random key is generated per process.
    #[serde(default, skip_serializing)]
    pub signing_key: Option<SecretString>,
}

impl BackOfficeGatewayConfig {
    /// Load configuration from an optional YAML file, then environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or a value has the wrong shape.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("invalid back-office gateway configuration")
    }

    /// Resolve the signing key, generating an ephemeral one if none is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured key is not valid base64 or is shorter
    /// than [`MIN_KEY_LEN`] bytes.
    pub fn signing_key(&self) -> anyhow::Result<SigningKey> {
        let Some(encoded) = &self.signing_key else {
            tracing::warn!(
                "No back-office signing key configured; using an ephemeral key. \
                 Tickets and anti-forgery tokens will not survive a restart."
            );
            return Ok(SigningKey::generate());
        };

        let bytes = STANDARD
            .decode(encoded.expose_secret().trim())
            .context("signing_key is not valid base64")?;
        if bytes.len() < MIN_KEY_LEN {
            bail!(
                "signing_key must be at least {MIN_KEY_LEN} bytes, got {}",
                bytes.len()
            );
        }
        Ok(SigningKey::from_bytes(bytes))
    }
}

fn default_csrf_cookie_name() -> String {
    "BO-XSRF-V".to_owned()
}

fn default_js_cookie_name() -> String {
    "BO-XSRF-TOKEN".to_owned()
}

fn default_header_name() -> String {
    "X-BO-XSRF-TOKEN".to_owned()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct AntiforgeryConfig {
    /// `HttpOnly` cookie carrying the cookie token.
    pub cookie_name: String,
    /// Script-readable cookie carrying the header token.
    pub js_cookie_name: String,
    /// Request header the client echoes the header token in.
    pub header_name: String,
    /// Whether issued cookies carry the `Secure` attribute.
    pub secure_cookie: bool,
}

impl Default for AntiforgeryConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_csrf_cookie_name(),
            js_cookie_name: default_js_cookie_name(),
            header_name: default_header_name(),
            secure_cookie: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct PreviewConfig {
    /// Cookie marking the browser as being in preview mode.
    pub preview_cookie_name: String,
    /// Back-office authentication cookie holding the protected ticket.
    pub auth_cookie_name: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            preview_cookie_name: "BO_PREVIEW".to_owned(),
            auth_cookie_name: "BO_UCONTEXT".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct PathsConfig {
    /// Root of the back-office surface.
    pub backoffice_path: String,
    /// Extensions served dynamically; any other extension marks a static asset.
    pub server_side_extensions: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            backoffice_path: "/backoffice".to_owned(),
            server_side_extensions: vec![".json".to_owned(), ".xml".to_owned()],
        }
    }
}
