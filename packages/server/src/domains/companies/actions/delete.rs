//! Delete action

use crate::domains::companies::errors::CompanyError;
use crate::domains::companies::models::{Company, CompanyEvent, EventOp};
use crate::domains::companies::store::CompanyEntity;
use crate::kernel::store::OperationKind;
use crate::kernel::ServerDeps;

use super::compensation::{publish_or_compensate, transition, Compensation, DualWriteState};
use super::returned_row;

/// Delete the company `id` and announce it, returning the removed row.
///
/// If the `delete` event cannot be delivered the removed row is inserted again.
pub async fn delete_company(id: &str, deps: &ServerDeps) -> Result<Company, CompanyError> {
    let mut entity = CompanyEntity::new(&deps.store);
    let result = delete(&mut entity, deps, id).await;
    entity.log_queries();
    result
}

async fn delete(
    entity: &mut CompanyEntity,
    deps: &ServerDeps,
    id: &str,
) -> Result<Company, CompanyError> {
    transition(id, EventOp::Delete, DualWriteState::Start);

    entity.prepare_delete(id)?;
    entity.execute().await?;
    let removed = returned_row(entity, OperationKind::Delete, id)?;

    let event = CompanyEvent::new(removed.clone(), EventOp::Delete);
    publish_or_compensate(entity, deps, event, Compensation::Reinsert(removed.clone())).await?;

    Ok(removed)
}
