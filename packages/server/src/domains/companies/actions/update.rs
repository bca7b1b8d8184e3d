//! Update action

use crate::domains::companies::errors::CompanyError;
use crate::domains::companies::models::{Company, CompanyEvent, EventOp, MutationRequest};
use crate::domains::companies::store::{CompanyEntity, QueryBuilder, SelectFilter};
use crate::kernel::store::OperationKind;
use crate::kernel::ServerDeps;

use super::compensation::{publish_or_compensate, transition, Compensation, DualWriteState};
use super::returned_row;

/// Apply `request` to the company `id` and announce the new state.
///
/// The body may repeat the id but may not name a different one. If the
/// `update` event cannot be delivered every column is put back to its value
/// before the update.
pub async fn update_company(
    id: &str,
    mut request: MutationRequest,
    deps: &ServerDeps,
) -> Result<Company, CompanyError> {
    request.bind_key(id)?;
    // Reject a bad request before reading the current row
    QueryBuilder::update(&request)?;

    let mut entity = CompanyEntity::new(&deps.store);
    let result = update(&mut entity, deps, id, &request).await;
    entity.log_queries();
    result
}

async fn update(
    entity: &mut CompanyEntity,
    deps: &ServerDeps,
    id: &str,
    request: &MutationRequest,
) -> Result<Company, CompanyError> {
    transition(id, EventOp::Update, DualWriteState::Start);

    entity.prepare_select(&SelectFilter::ById(id.to_string()))?;
    entity.execute().await?;
    let before = returned_row(entity, OperationKind::Select, id)?;

    entity.prepare_update(request)?;
    entity.execute().await?;
    let after = returned_row(entity, OperationKind::Update, id)?;

    let event = CompanyEvent::new(after.clone(), EventOp::Update);
    publish_or_compensate(entity, deps, event, Compensation::Restore(before)).await?;

    Ok(after)
}
