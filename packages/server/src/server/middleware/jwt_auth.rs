use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::{middleware::Next, response::Response};
use tracing::debug;

use crate::common::AuthError;
use crate::domains::auth::JwtService;

/// Authenticated caller, taken from a verified bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub username: String,
    pub token_id: String,
}

/// JWT authentication middleware
///
/// Verifies the bearer token, if any, and adds `AuthUser` to request
/// extensions. Requests without a valid token continue unauthenticated; routes
/// that need a caller take `AuthUser` as an extractor.
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(user) = extract_auth_user(&request, &jwt_service) {
        debug!(username = %user.username, "Authenticated request");
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}

/// Extract and verify JWT token from request
fn extract_auth_user(
    request: &axum::http::Request<axum::body::Body>,
    jwt_service: &JwtService,
) -> Option<AuthUser> {
    let auth_header = request.headers().get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?;

    let claims = jwt_service.verify_token(token).ok()?;

    Some(AuthUser {
        username: claims.sub,
        token_id: claims.jti,
    })
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::AuthenticationRequired)
    }
}
