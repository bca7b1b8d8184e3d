//! Login action

use tracing::{info, warn};

use crate::common::AuthError;
use crate::domains::auth::models::LoginRequest;
use crate::kernel::ServerDeps;

/// Exchange admin credentials for a signed bearer token.
pub fn login(request: &LoginRequest, deps: &ServerDeps) -> Result<String, AuthError> {
    if !deps.admin.matches(request) {
        warn!(username = %request.username, "Rejected login");
        return Err(AuthError::InvalidCredentials);
    }

    let token = deps.jwt_service.create_token(&request.username)?;
    info!(username = %request.username, "Issued token");
    Ok(token)
}
