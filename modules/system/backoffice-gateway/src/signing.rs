//! HMAC-SHA256 sealing of opaque payloads into URL-safe strings.
//!
//! A sealed value is `base64url(payload ++ tag)` where `tag` is the 32-byte
//! HMAC of `purpose ++ 0x00 ++ payload`. Binding the purpose keeps a value
//! sealed for one use (e.g. a ticket) from verifying as another (e.g. a token).

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretSlice};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const TAG_LEN: usize = 32;

/// Minimum accepted key length in bytes.
pub const MIN_KEY_LEN: usize = 32;

/// Process-wide signing key material.
pub struct SigningKey {
    bytes: SecretSlice<u8>,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl SigningKey {
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: SecretSlice::from(bytes),
        }
    }

    /// Fresh random key.
    #[must_use]
    pub fn generate() -> Self {
        let bytes: [u8; MIN_KEY_LEN] = rand::random();
        Self::from_bytes(bytes.to_vec())
    }

    fn mac(&self, purpose: &str, payload: &[u8]) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.bytes.expose_secret()).ok()?;
        mac.update(purpose.as_bytes());
        mac.update(&[0]);
        mac.update(payload);
        Some(mac)
    }

    /// Seal `payload` for `purpose`. Returns `None` only if the key is unusable.
    #[must_use]
    pub fn seal(&self, purpose: &str, payload: &[u8]) -> Option<String> {
        let tag = self.mac(purpose, payload)?.finalize().into_bytes();
        let mut out = Vec::with_capacity(payload.len() + TAG_LEN);
        out.extend_from_slice(payload);
        out.extend_from_slice(&tag);
        Some(URL_SAFE_NO_PAD.encode(out))
    }

    /// Verify and unwrap a value produced by [`seal`](Self::seal) for the same purpose.
    ///
    /// Tag comparison is constant-time.
    #[must_use]
    pub fn open(&self, purpose: &str, sealed: &str) -> Option<Vec<u8>> {
        let mut raw = URL_SAFE_NO_PAD.decode(sealed.trim()).ok()?;
        if raw.len() < TAG_LEN {
            return None;
        }
        let tag = raw.split_off(raw.len() - TAG_LEN);
        self.mac(purpose, &raw)?.verify_slice(&tag).ok()?;
        Some(raw)
    }
}
