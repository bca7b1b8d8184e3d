//! Get and list actions

use crate::domains::companies::errors::CompanyError;
use crate::domains::companies::models::Company;
use crate::domains::companies::store::{CompanyEntity, SelectFilter};
use crate::kernel::store::OperationKind;
use crate::kernel::ServerDeps;

use super::returned_row;

/// Fetch one company by id.
pub async fn get_company(id: &str, deps: &ServerDeps) -> Result<Company, CompanyError> {
    let mut entity = CompanyEntity::new(&deps.store);
    let result = select_one(&mut entity, id).await;
    entity.log_queries();
    result
}

async fn select_one(entity: &mut CompanyEntity, id: &str) -> Result<Company, CompanyError> {
    entity.prepare_select(&SelectFilter::ById(id.to_string()))?;
    entity.execute().await?;
    Ok(returned_row(entity, OperationKind::Select, id)?)
}

/// Every company, ordered by id. An empty table is an empty list.
pub async fn list_companies(deps: &ServerDeps) -> Result<Vec<Company>, CompanyError> {
    let mut entity = CompanyEntity::new(&deps.store);
    let result = select_all(&mut entity).await;
    entity.log_queries();
    result?;
    Ok(entity.into_rows())
}

async fn select_all(entity: &mut CompanyEntity) -> Result<(), CompanyError> {
    entity.prepare_select(&SelectFilter::All)?;
    entity.execute().await?;
    Ok(())
}
