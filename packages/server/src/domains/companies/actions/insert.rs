//! Insert action

use uuid::Uuid;

use crate::domains::companies::errors::CompanyError;
use crate::domains::companies::models::{Company, CompanyEvent, EventOp};
use crate::domains::companies::store::CompanyEntity;
use crate::kernel::ServerDeps;

use super::compensation::{publish_or_compensate, transition, Compensation, DualWriteState};

/// Insert a company and announce it. An empty id is replaced by a fresh one.
///
/// If the `insert` event cannot be delivered the row is deleted again.
pub async fn insert_company(mut company: Company, deps: &ServerDeps) -> Result<Company, CompanyError> {
    if company.id.is_empty() {
        company.id = Uuid::now_v7().to_string();
    }

    let mut entity = CompanyEntity::new(&deps.store);
    let result = insert(&mut entity, deps, company).await;
    entity.log_queries();
    result
}

async fn insert(
    entity: &mut CompanyEntity,
    deps: &ServerDeps,
    company: Company,
) -> Result<Company, CompanyError> {
    transition(&company.id, EventOp::Insert, DualWriteState::Start);
    entity.prepare_insert(&company)?;
    entity.execute().await?;

    let undo = Compensation::Delete(company.id.clone());
    let event = CompanyEvent::new(company.clone(), EventOp::Insert);
    publish_or_compensate(entity, deps, event, undo).await?;

    Ok(company)
}
