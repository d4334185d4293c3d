//! Caller identity forwarded by the authenticating edge

use super::models::{error_codes, ApiError, ApiFailure};
use crate::profile::UserIdentity;
use axum::{
    http::{HeaderMap, StatusCode},
    Json,
};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Resolve the calling user; a missing id is rejected with 401
pub fn caller_identity(headers: &HeaderMap) -> Result<UserIdentity, ApiFailure> {
    let user_id = header_value(headers, USER_ID_HEADER).ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiError::new(
                error_codes::UNAUTHORIZED,
                format!("Missing {} header", USER_ID_HEADER),
            )),
        )
    })?;

    Ok(UserIdentity {
        user_id,
        email: header_value(headers, USER_EMAIL_HEADER).unwrap_or_default(),
        name: header_value(headers, USER_NAME_HEADER),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_missing_user_is_unauthorized() {
        let (status, _) = caller_identity(&HeaderMap::new()).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("   "));
        assert!(caller_identity(&headers).is_err());
    }

    #[test]
    fn test_identity_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("uid-42"));
        headers.insert(USER_NAME_HEADER, HeaderValue::from_static("Ada"));

        let identity = caller_identity(&headers).unwrap();
        assert_eq!(identity.user_id, "uid-42");
        assert_eq!(identity.email, "");
        assert_eq!(identity.name.as_deref(), Some("Ada"));
    }
}
