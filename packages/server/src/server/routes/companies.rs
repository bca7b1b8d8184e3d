use axum::{
    extract::{Extension, Path},
    Json,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::domains::companies::actions;
use crate::domains::companies::{Company, CompanyError, MutationRequest};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

/// Company ids are UUIDs on the wire. Returns the canonical form.
fn parse_id(id: &str) -> Result<String, CompanyError> {
    Uuid::parse_str(id)
        .map(|uuid| uuid.to_string())
        .map_err(|_| CompanyError::InvalidId(id.to_string()))
}

pub async fn list_companies_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<Company>>, CompanyError> {
    let companies = actions::list_companies(&state.deps).await?;
    Ok(Json(companies))
}

pub async fn get_company_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Company>, CompanyError> {
    let id = parse_id(&id)?;
    let company = actions::get_company(&id, &state.deps).await?;
    Ok(Json(company))
}

pub async fn create_company_handler(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Json(body): Json<JsonValue>,
) -> Result<Json<Company>, CompanyError> {
    let mut company = Company::from_value(body)?;
    // Ids are assigned on insert; a client-supplied one is ignored
    company.id = String::new();
    let company = actions::insert_company(company, &state.deps).await?;
    Ok(Json(company))
}

pub async fn update_company_handler(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(body): Json<JsonValue>,
) -> Result<Json<Company>, CompanyError> {
    let id = parse_id(&id)?;
    let mut request = MutationRequest::from_value(body)?;
    if let Some(body_id) = request.id.take() {
        request.id = Some(parse_id(&body_id)?);
    }
    let company = actions::update_company(&id, request, &state.deps).await?;
    Ok(Json(company))
}

pub async fn delete_company_handler(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Company>, CompanyError> {
    let id = parse_id(&id)?;
    let company = actions::delete_company(&id, &state.deps).await?;
    Ok(Json(company))
}
