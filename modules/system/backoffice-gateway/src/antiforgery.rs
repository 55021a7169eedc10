//! Double-submit anti-forgery tokens bound to the back-office identity.
//!
//! The cookie token carries a random security token. The header token carries
//! the same security token plus a hash of the current user's identifier, so a
//! pair issued to one user does not validate for another. Both tokens are
//! postcard-encoded and sealed with the process signing key.

use std::sync::Arc;

use backoffice_security::{ClaimsPrincipal, Identity};
use backoffice_security::constants::claim_types;
use http::HeaderMap;
use http::request::Parts;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::config::AntiforgeryConfig;
use crate::cookies::{CookieOptions, SameSite, append_set_cookie, read_cookie};
use crate::signing::SigningKey;

const COOKIE_TOKEN_PURPOSE: &str = "backoffice.antiforgery.cookie.v1";
const HEADER_TOKEN_PURPOSE: &str = "backoffice.antiforgery.header.v1";

type SecurityToken = [u8; 16];
type ClaimUid = [u8; 32];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AntiforgeryError {
    #[error("the anti-forgery cookie token is missing")]
    MissingCookieToken,

    #[error("the anti-forgery header token is missing")]
    MissingHeaderToken,

    #[error("the anti-forgery cookie token is malformed")]
    MalformedCookieToken,

    #[error("the anti-forgery header token is malformed")]
    MalformedHeaderToken,

    #[error("the anti-forgery cookie token and header token do not match")]
    TokenMismatch,

    #[error("the anti-forgery header token was issued for a different user")]
    UserMismatch,

    #[error("anti-forgery tokens were already generated for this request")]
    TokensAlreadyGenerated,

    #[error("failed to encode anti-forgery token: {0}")]
    Encoding(String),
}

/// A freshly issued token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntiforgeryTokenSet {
    pub cookie_token: String,
    pub header_token: String,
}

#[derive(Serialize, Deserialize)]
struct CookieToken {
    security_token: SecurityToken,
}

#[derive(Serialize, Deserialize)]
struct HeaderToken {
    security_token: SecurityToken,
    claim_uid: Option<ClaimUid>,
}

/// Request-scoped marker stored in the request extensions.
#[derive(Debug, Clone, Copy, Default)]
struct AntiforgeryFeature {
    tokens_generated: bool,
}

/// Issues and validates back-office anti-forgery token pairs.
#[derive(Debug, Clone)]
pub struct BackOfficeAntiforgery {
    key: Arc<SigningKey>,
    options: AntiforgeryConfig,
}

impl BackOfficeAntiforgery {
    #[must_use]
    pub fn new(key: Arc<SigningKey>, options: AntiforgeryConfig) -> Self {
        Self { key, options }
    }

    #[must_use]
    pub fn options(&self) -> &AntiforgeryConfig {
        &self.options
    }

    /// Issue a token pair for the principal in `request`.
    ///
    /// A valid cookie token already present on the request is reused;
    /// otherwise a new one is written to `response_headers` as an `HttpOnly`
    /// cookie. The header token is returned for the caller to hand to the
    /// client. After this call the same request can no longer be validated.
    ///
    /// # Errors
    ///
    /// Returns [`AntiforgeryError::Encoding`] if a token cannot be sealed or
    /// the configured cookie name cannot be written into a `Set-Cookie` header.
    pub fn get_and_store_tokens(
        &self,
        request: &mut Parts,
        response_headers: &mut HeaderMap,
    ) -> Result<AntiforgeryTokenSet, AntiforgeryError> {
        let existing = read_cookie(&request.headers, &self.options.cookie_name)
            .and_then(|raw| self.open_cookie_token(raw).map(|t| (raw.to_owned(), t)));

        let (cookie_token, security_token) = if let Some((raw, token)) = existing {
            (raw, token.security_token)
        } else {
            let security_token: SecurityToken = rand::random();
            let raw = self.seal(COOKIE_TOKEN_PURPOSE, &CookieToken { security_token })?;
            append_set_cookie(
                response_headers,
                &self.options.cookie_name,
                &raw,
                CookieOptions {
                    http_only: true,
                    secure: self.options.secure_cookie,
                    same_site: SameSite::Strict,
                },
            )
            .map_err(|e| AntiforgeryError::Encoding(e.to_string()))?;
            (raw, security_token)
        };

        let header_token = self.seal(
            HEADER_TOKEN_PURPOSE,
            &HeaderToken {
                security_token,
                claim_uid: claim_uid(request.extensions.get::<ClaimsPrincipal>()),
            },
        )?;

        request.extensions.insert(AntiforgeryFeature {
            tokens_generated: true,
        });

        Ok(AntiforgeryTokenSet {
            cookie_token,
            header_token,
        })
    }

    /// Issue a token pair and also expose the header token in the
    /// script-readable cookie the back-office client echoes back.
    ///
    /// # Errors
    ///
    /// Same as [`get_and_store_tokens`](Self::get_and_store_tokens).
    pub fn set_antiforgery_cookies(
        &self,
        request: &mut Parts,
        response_headers: &mut HeaderMap,
    ) -> Result<AntiforgeryTokenSet, AntiforgeryError> {
        let tokens = self.get_and_store_tokens(request, response_headers)?;
        append_set_cookie(
            response_headers,
            &self.options.js_cookie_name,
            &tokens.header_token,
            CookieOptions {
                http_only: false,
                secure: self.options.secure_cookie,
                same_site: SameSite::Strict,
            },
        )
        .map_err(|e| AntiforgeryError::Encoding(e.to_string()))?;
        Ok(tokens)
    }

    /// Check the request's cookie/header token pair against each other and
    /// against the current principal.
    ///
    /// # Errors
    ///
    /// Returns the first [`AntiforgeryError`] found; the caller decides how to
    /// reject the request.
    pub fn validate_request(&self, request: &Parts) -> Result<(), AntiforgeryError> {
        if request
            .extensions
            .get::<AntiforgeryFeature>()
            .is_some_and(|f| f.tokens_generated)
        {
            return Err(AntiforgeryError::TokensAlreadyGenerated);
        }

        let raw_cookie = read_cookie(&request.headers, &self.options.cookie_name)
            .filter(|v| !v.is_empty())
            .ok_or(AntiforgeryError::MissingCookieToken)?;
        let raw_header = request
            .headers
            .get(self.options.header_name.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AntiforgeryError::MissingHeaderToken)?;

        let cookie = self
            .open_cookie_token(raw_cookie)
            .ok_or(AntiforgeryError::MalformedCookieToken)?;
        let header: HeaderToken = self
            .key
            .open(HEADER_TOKEN_PURPOSE, raw_header)
            .and_then(|bytes| postcard::from_bytes(&bytes).ok())
            .ok_or(AntiforgeryError::MalformedHeaderToken)?;

        if !bool::from(cookie.security_token[..].ct_eq(&header.security_token[..])) {
            return Err(AntiforgeryError::TokenMismatch);
        }

        let current = claim_uid(request.extensions.get::<ClaimsPrincipal>());
        let same_user = match (header.claim_uid, current) {
            (Some(issued), Some(current)) => bool::from(issued[..].ct_eq(&current[..])),
            (None, None) => true,
            _ => false,
        };
        if !same_user {
            return Err(AntiforgeryError::UserMismatch);
        }

        Ok(())
    }

    fn seal<T: Serialize>(&self, purpose: &str, token: &T) -> Result<String, AntiforgeryError> {
        let bytes =
            postcard::to_allocvec(token).map_err(|e| AntiforgeryError::Encoding(e.to_string()))?;
        self.key
            .seal(purpose, &bytes)
            .ok_or_else(|| AntiforgeryError::Encoding("signing key is unusable".to_owned()))
    }

    fn open_cookie_token(&self, raw: &str) -> Option<CookieToken> {
        let bytes = self.key.open(COOKIE_TOKEN_PURPOSE, raw)?;
        postcard::from_bytes(&bytes).ok()
    }
}

/// Stable hash of the authenticated user's identifier, or `None` for an
/// anonymous principal.
fn claim_uid(principal: Option<&ClaimsPrincipal>) -> Option<ClaimUid> {
    let principal = principal.filter(|p| p.is_authenticated())?;
    let authenticated = || {
        principal
            .identities()
            .iter()
            .filter(|identity| identity.is_authenticated())
    };

    let (kind, value) = if let Some(identity) = principal.back_office_identity() {
        ("id", identity.id().to_string())
    } else if let Some(user_id) = authenticated().find_map(Identity::user_id) {
        ("id", user_id.to_owned())
    } else {
        let username = authenticated()
            .flat_map(Identity::claims)
            .find(|c| c.is(claim_types::USERNAME))?;
        ("name", username.value().to_owned())
    };

    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update([0]);
    hasher.update(value.as_bytes());
    Some(hasher.finalize().into())
}
