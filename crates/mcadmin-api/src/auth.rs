//! Shared-secret authentication for the Data API.

use axum::http::HeaderMap;
use mcadmin_core::ApiKey;
use subtle::ConstantTimeEq;

use crate::error::ApiError;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// The configured secret, loaded once at startup and never changed.
#[derive(Clone)]
pub struct AuthContext {
    key: ApiKey,
}

impl AuthContext {
    /// Wrap the configured secret.
    pub const fn new(key: ApiKey) -> Self {
        Self { key }
    }

    /// Whether `presented` matches the secret, compared in constant time.
    pub fn matches(&self, presented: &[u8]) -> bool {
        self.key.expose().as_bytes().ct_eq(presented).into()
    }

    /// Check the `X-API-Key` header of a request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the header is absent or
    /// does not match.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        match headers.get(API_KEY_HEADER) {
            Some(value) if self.matches(value.as_bytes()) => Ok(()),
            _ => Err(ApiError::Unauthorized),
        }
    }
}

impl core::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthContext")
            .field("key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use axum::http::HeaderValue;

    use super::*;

    fn context() -> AuthContext {
        AuthContext::new(ApiKey::new("s3cret"))
    }

    #[test]
    fn exact_key_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("s3cret"));
        assert!(context().authorize(&headers).is_ok());
    }

    #[test]
    fn missing_wrong_or_prefixed_keys_are_rejected() {
        assert!(matches!(
            context().authorize(&HeaderMap::new()),
            Err(ApiError::Unauthorized)
        ));
        for presented in ["wrong", "s3cre", "s3cret ", "S3CRET", ""] {
            let mut headers = HeaderMap::new();
            headers.insert(API_KEY_HEADER, HeaderValue::from_str(presented).unwrap());
            assert!(context().authorize(&headers).is_err(), "{presented:?} accepted");
        }
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let printed = format!("{:?}", context());
        assert!(!printed.contains("s3cret"));
        assert!(printed.contains("redacted"));
    }
}
