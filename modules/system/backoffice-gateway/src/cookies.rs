use http::header::InvalidHeaderValue;
use http::{HeaderMap, HeaderValue, header};

/// Value of the first request cookie named `name`, across all `Cookie` headers.
#[must_use]
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(n, _)| *n == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
}

/// Whether a request cookie named `name` is present (its value may be empty).
#[must_use]
pub fn has_cookie(headers: &HeaderMap, name: &str) -> bool {
    read_cookie(headers, name).is_some()
}

/// Attributes of a `Set-Cookie` response header.
#[derive(Debug, Clone, Copy)]
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
        }
    }
}

/// Append a `Set-Cookie` header with path `/`.
///
/// # Errors
///
/// Returns an error if the rendered cookie is not valid header text; nothing is
/// appended in that case.
pub fn append_set_cookie(
    headers: &mut HeaderMap,
    name: &str,
    value: &str,
    opts: CookieOptions,
) -> Result<(), InvalidHeaderValue> {
    let http_only = if opts.http_only { "; HttpOnly" } else { "" };
    let secure = if opts.secure { "; Secure" } else { "" };
    let raw = format!(
        "{name}={value}; Path=/; SameSite={same_site}{http_only}{secure}",
        same_site = opts.same_site.as_str(),
    );
    headers.append(header::SET_COOKIE, HeaderValue::from_str(&raw)?);
    Ok(())
}
