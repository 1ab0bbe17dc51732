//! Shared-password authorization for write endpoints.
//!
//! Clients send `Authorization: Bearer <password>`. The password is compared
//! in constant time so response timing does not leak how many leading
//! bytes matched.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header. Use \"Bearer xxxxx\".")]
    MissingHeader,
    #[error("Unauthorized.")]
    WrongPassword,
}

/// The backend password, held for comparison only.
#[derive(Clone)]
pub struct BackendPassword(Vec<u8>);

impl BackendPassword {
    #[must_use]
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into().into_bytes())
    }

    /// Checks the `Authorization` header.
    ///
    /// # Errors
    ///
    /// [`AuthError::MissingHeader`] when there is no usable bearer token,
    /// [`AuthError::WrongPassword`] when the token does not match.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingHeader)?;

        if bool::from(token.as_bytes().ct_eq(&self.0)) {
            Ok(())
        } else {
            Err(AuthError::WrongPassword)
        }
    }
}

impl std::fmt::Debug for BackendPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BackendPassword(..)")
    }
}
