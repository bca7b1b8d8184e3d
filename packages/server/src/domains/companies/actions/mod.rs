//! Company actions - business logic functions
//!
//! Actions are async functions called directly from the HTTP routes. Each one
//! owns a request-local `CompanyEntity` and flushes its query log on the way
//! out.

pub mod compensation;
mod delete;
mod insert;
mod read;
mod update;

pub use compensation::{Compensation, DualWriteState};
pub use delete::delete_company;
pub use insert::insert_company;
pub use read::{get_company, list_companies};
pub use update::update_company;

use crate::domains::companies::models::Company;
use crate::domains::companies::store::CompanyEntity;
use crate::kernel::store::{OperationKind, StoreError};

/// The row a keyed statement just returned.
fn returned_row(
    entity: &CompanyEntity,
    operation: OperationKind,
    id: &str,
) -> Result<Company, StoreError> {
    entity.row().cloned().ok_or_else(|| StoreError::NotFound {
        operation,
        id: id.to_string(),
    })
}
