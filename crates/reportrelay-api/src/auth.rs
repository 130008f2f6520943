//! Admin password check for the upload endpoints.

use axum::http::HeaderMap;
use reportrelay_core::AppError;
use subtle::ConstantTimeEq;

pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Password from the `X-Admin-Password` header, if present.
pub fn header_password(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ADMIN_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Checks the supplied password. The header wins over the form field.
pub fn verify_admin_password(
    expected: &str,
    from_header: Option<&str>,
    from_form: Option<&str>,
) -> Result<(), AppError> {
    let supplied = from_header.or(from_form).unwrap_or_default();
    if secure_compare(supplied, expected) {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Invalid admin password".to_string()))
    }
}
