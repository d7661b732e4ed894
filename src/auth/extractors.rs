use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::{TokenError, TokenService};
use crate::{error::AppError, state::AppState};

/// Identity of the caller, resolved from a verified token for this request only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

/// Reads `Authorization: Bearer <token>` and validates the token.
pub fn validate_request_identity(headers: &HeaderMap, tokens: &TokenService) -> Result<Uuid, TokenError> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(TokenError::Missing)?;

    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(TokenError::Missing)?;

    tokens.validate(token)
}

/// Guards protected routes: on success the caller's identity is stored in the
/// request extensions, otherwise the request stops here with a 401.
pub async fn require_auth(
    State(tokens): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = validate_request_identity(req.headers(), &tokens).map_err(|e| {
        warn!(cause = %e, path = %req.uri().path(), "unauthorized request");
        AppError::Unauthorized(e)
    })?;
    req.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(req).await)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        // Only `require_auth` puts this here; a route without the guard gets a 401.
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(AppError::Unauthorized(TokenError::Missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::config::AppConfig;
    use axum::http::HeaderValue;

    fn tokens() -> TokenService {
        TokenService::new(&AppConfig::for_tests().jwt, Arc::new(SystemClock))
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn accepts_bearer_token() {
        let tokens = tokens();
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id).unwrap();
        let headers = headers_with(&format!("Bearer {token}"));
        assert_eq!(validate_request_identity(&headers, &tokens), Ok(user_id));
    }

    #[test]
    fn missing_header_is_missing() {
        assert_eq!(
            validate_request_identity(&HeaderMap::new(), &tokens()),
            Err(TokenError::Missing)
        );
    }

    #[test]
    fn other_scheme_is_missing() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        assert_eq!(validate_request_identity(&headers, &tokens()), Err(TokenError::Missing));
    }

    #[test]
    fn bad_token_is_refused() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert!(validate_request_identity(&headers, &tokens()).is_err());
    }
}
