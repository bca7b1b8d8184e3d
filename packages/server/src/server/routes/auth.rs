use axum::{
    extract::Extension,
    http::{header::AUTHORIZATION, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::Value as JsonValue;

use crate::common::AuthError;
use crate::domains::auth::actions::login;
use crate::domains::auth::LoginRequest;
use crate::server::app::AppState;

/// `POST /login`: exchange admin credentials for a bearer token, returned in
/// the `Authorization` response header.
pub async fn login_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<JsonValue>,
) -> Result<impl IntoResponse, AuthError> {
    let request: LoginRequest =
        serde_json::from_value(body).map_err(|e| AuthError::InvalidRequest(e.to_string()))?;

    let token = login(&request, &state.deps)?;
    Ok((StatusCode::OK, [(AUTHORIZATION, format!("Bearer {token}"))]))
}
