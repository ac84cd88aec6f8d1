//! Authentication module.
//!
//! Two layers: an optional pre-shared key guarding the admin API (constant-time
//! comparison to mitigate timing attacks), and member identity extracted from
//! the access proxy in front of the site (header on protected paths, JWT
//! cookie elsewhere, a plain cookie in dev).

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use subtle::ConstantTimeEq;

use crate::errors::{codes, AppError, ErrorDetails, ErrorResponse};
use crate::models::Member;
use crate::store::GithubStore;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header set by the access proxy on protected paths.
pub const AUTH_EMAIL_HEADER: &str = "cf-access-authenticated-user-email";

/// PSK authentication layer function that takes the expected PSK as a parameter.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    // If no PSK is configured, allow all requests (dev mode)
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    // Get the API key from the request header
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    match provided {
        Some(provided_key) => {
            if constant_time_compare(&provided_key, &expected) {
                next.run(request).await
            } else {
                unauthorized_response("Invalid API key")
            }
        }
        None => {
            // Also check Authorization header as bearer token
            let bearer = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(|s| s.to_string());

            match bearer {
                Some(bearer_key) if constant_time_compare(&bearer_key, &expected) => {
                    next.run(request).await
                }
                _ => unauthorized_response("Missing or invalid API key"),
            }
        }
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Create an unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    let body = ErrorResponse {
        success: false,
        error: ErrorDetails {
            code: codes::UNAUTHORIZED.to_string(),
            message: message.to_string(),
            details: None,
        },
    };

    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Pull the email claim out of an access-proxy JWT without verifying it.
/// The proxy already verified the token; this only recovers the identity.
fn email_from_jwt(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    claims["email"].as_str().map(String::from)
}

/// Extract the authenticated caller's email, checking in order the proxy
/// header, the proxy JWT cookie, and the dev login cookie.
pub fn authenticated_email(headers: &HeaderMap) -> Option<String> {
    if let Some(email) = headers.get(AUTH_EMAIL_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(email.to_string());
    }

    if let Some(token) = cookie_value(headers, "CF_Authorization") {
        if let Some(email) = email_from_jwt(&token) {
            return Some(email);
        }
    }

    cookie_value(headers, "dev_auth_email")
}

/// Require the caller to be a known member.
pub async fn require_member(store: &GithubStore, headers: &HeaderMap) -> Result<Member, AppError> {
    let email = authenticated_email(headers)
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

    let (members, _) = store.fetch_members().await?;
    members
        .into_iter()
        .find(|m| {
            m.email
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case(&email))
        })
        .ok_or_else(|| AppError::Forbidden("Not a member".to_string()))
}

/// Require the caller to be an admin member.
pub async fn require_admin(store: &GithubStore, headers: &HeaderMap) -> Result<Member, AppError> {
    let member = require_member(store, headers).await?;
    if !member.is_admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    Ok(member)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("test-key-123", "test-key-123"));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare("test-key-123", "test-key-124"));
    }

    #[test]
    fn test_constant_time_compare_different_lengths() {
        assert!(!constant_time_compare("short", "much-longer-key"));
    }

    #[test]
    fn test_email_from_proxy_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_EMAIL_HEADER, HeaderValue::from_static("ada@example.org"));
        assert_eq!(
            authenticated_email(&headers).as_deref(),
            Some("ada@example.org")
        );
    }

    #[test]
    fn test_email_from_jwt_cookie() {
        let payload = URL_SAFE_NO_PAD.encode(r#"{"email":"ada@example.org"}"#);
        let token = format!("header.{}.signature", payload);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("other=1; CF_Authorization={}", token)).unwrap(),
        );
        assert_eq!(
            authenticated_email(&headers).as_deref(),
            Some("ada@example.org")
        );
    }

    #[test]
    fn test_malformed_jwt_falls_through_to_dev_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("CF_Authorization=not-a-jwt; dev_auth_email=dev@example.org"),
        );
        assert_eq!(
            authenticated_email(&headers).as_deref(),
            Some("dev@example.org")
        );
    }

    #[test]
    fn test_no_identity() {
        assert!(authenticated_email(&HeaderMap::new()).is_none());
    }
}
