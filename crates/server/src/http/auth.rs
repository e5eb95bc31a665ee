use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use utils::response::ApiResponse;

use crate::AppState;

pub(crate) fn parse_authorization_bearer(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let (prefix, rest) = trimmed.split_once(' ')?;
    if !prefix.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_bearer)
}

/// Compares SHA-256 digests in constant time so neither the content nor the
/// length of `expected` leaks through timing.
pub(crate) fn secret_matches(provided: &str, expected: &str) -> bool {
    let provided = Sha256::digest(provided.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    provided.ct_eq(&expected).into()
}

pub(crate) fn unauthorized() -> Response {
    let response = ApiResponse::<()>::error("Unauthorized");
    (StatusCode::UNAUTHORIZED, Json(response)).into_response()
}

/// Resolves the bearer token to a `CurrentUser` and stores it in the request
/// extensions for the handlers behind this layer.
pub async fn require_user(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(token) = bearer_token(req.headers()) else {
        tracing::debug!(
            path = %req.uri().path(),
            method = %req.method(),
            "request without bearer token"
        );
        return unauthorized();
    };

    match state.auth().current_user(token).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(err) => {
            tracing::warn!(
                path = %req.uri().path(),
                method = %req.method(),
                error = %err,
                "Unauthorized API request"
            );
            unauthorized()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_prefix_is_case_insensitive() {
        assert_eq!(parse_authorization_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_authorization_bearer("bearer   abc  "), Some("abc"));
        assert_eq!(parse_authorization_bearer("Basic abc"), None);
        assert_eq!(parse_authorization_bearer("Bearer "), None);
        assert_eq!(parse_authorization_bearer("abc"), None);
    }

    #[test]
    fn secret_matches_only_the_exact_value() {
        assert!(secret_matches("sekrit", "sekrit"));
        assert!(!secret_matches("sekrip", "sekrit"));
        assert!(!secret_matches("sekri", "sekrit"));
        assert!(!secret_matches("sekrit ", "sekrit"));
        assert!(!secret_matches("", "sekrit"));
    }
}
