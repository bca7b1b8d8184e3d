//! Statement construction for the `companies` table.
//!
//! Every builder is pure: it validates its input and returns the SQL text
//! together with the positional parameters, in the exact order of the `$n`
//! placeholders. Nothing here talks to the database.

use serde::Serialize;
use sqlx::postgres::PgArguments;
use sqlx::Arguments;

use crate::domains::companies::models::{Company, CompanyKind, MutationRequest};
use crate::kernel::store::{OperationKind, StoreError};

pub const COMPANIES_TABLE: &str = "companies";

const COL_ID: &str = "id";
const COL_NAME: &str = "name";
const COL_DESCRIPTION: &str = "description";
const COL_EMPLOYEE_COUNT: &str = "employee_count";
const COL_REGISTERED: &str = "registered";
const COL_COMPANY_TYPE: &str = "company_type";

/// Table column order. Inserts bind in this order.
const COLUMNS: [&str; 6] = [
    COL_ID,
    COL_NAME,
    COL_DESCRIPTION,
    COL_EMPLOYEE_COUNT,
    COL_REGISTERED,
    COL_COMPANY_TYPE,
];

/// One bound parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Text(String),
    NullableText(Option<String>),
    Int(i32),
    Bool(bool),
    Kind(CompanyKind),
}

/// Row filter for a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectFilter {
    /// Unconditional scan
    All,
    ById(String),
}

/// A prepared statement and its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub operation: OperationKind,
    pub sql: String,
    pub params: Vec<SqlParam>,
    /// Identifier the statement is filtered on, if any
    pub key: Option<String>,
}

impl Statement {
    pub(crate) fn arguments(&self) -> Result<PgArguments, StoreError> {
        let mut arguments = PgArguments::default();
        for param in &self.params {
            let added = match param {
                SqlParam::Text(value) => arguments.add(value.clone()),
                SqlParam::NullableText(value) => arguments.add(value.clone()),
                SqlParam::Int(value) => arguments.add(*value),
                SqlParam::Bool(value) => arguments.add(*value),
                SqlParam::Kind(value) => arguments.add(*value),
            };
            added.map_err(|e| StoreError::Database(sqlx::Error::Encode(e)))?;
        }
        Ok(arguments)
    }
}

/// Builds statements for the single company record shape.
pub struct QueryBuilder;

impl QueryBuilder {
    pub fn insert(company: &Company) -> Result<Statement, StoreError> {
        let operation = OperationKind::Insert;
        let id = require_key(operation, &company.id)?;
        check_name(operation, &company.name)?;
        check_employee_count(operation, company.employee_count)?;

        let placeholders = (1..=COLUMNS.len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Statement {
            operation,
            sql: format!(
                "INSERT INTO {COMPANIES_TABLE} ({}) VALUES ({placeholders})",
                COLUMNS.join(", ")
            ),
            params: vec![
                SqlParam::Text(id.to_string()),
                SqlParam::Text(company.name.clone()),
                SqlParam::NullableText(company.description.clone()),
                SqlParam::Int(company.employee_count),
                SqlParam::Bool(company.registered),
                SqlParam::Kind(company.kind),
            ],
            key: Some(id.to_string()),
        })
    }

    pub fn select(filter: &SelectFilter) -> Result<Statement, StoreError> {
        let operation = OperationKind::Select;
        let columns = COLUMNS.join(", ");

        match filter {
            SelectFilter::All => Ok(Statement {
                operation,
                sql: format!("SELECT {columns} FROM {COMPANIES_TABLE} ORDER BY {COL_ID}"),
                params: Vec::new(),
                key: None,
            }),
            SelectFilter::ById(id) => {
                let id = require_key(operation, id)?;
                Ok(Statement {
                    operation,
                    sql: format!("SELECT {columns} FROM {COMPANIES_TABLE} WHERE {COL_ID} = $1"),
                    params: vec![SqlParam::Text(id.to_string())],
                    key: Some(id.to_string()),
                })
            }
        }
    }

    /// Build an `UPDATE ... RETURNING` for every slot present in the patch.
    ///
    /// Assignments are emitted in sorted column order and numbered in that
    /// same order; the key is always the last parameter.
    pub fn update(request: &MutationRequest) -> Result<Statement, StoreError> {
        let operation = OperationKind::Update;
        let id = require_key(operation, request.id.as_deref().unwrap_or_default())?;
        let patch = &request.patch;
        if patch.is_empty() {
            return Err(StoreError::InvalidArg {
                operation,
                reason: "no updatable field besides id".to_string(),
            });
        }

        let mut assignments: Vec<(&'static str, SqlParam)> = Vec::new();
        if let Some(name) = &patch.name {
            check_name(operation, name)?;
            assignments.push((COL_NAME, SqlParam::Text(name.clone())));
        }
        if let Some(description) = &patch.description {
            assignments.push((
                COL_DESCRIPTION,
                SqlParam::NullableText(description.clone()),
            ));
        }
        if let Some(count) = patch.employee_count {
            check_employee_count(operation, count)?;
            assignments.push((COL_EMPLOYEE_COUNT, SqlParam::Int(count)));
        }
        if let Some(registered) = patch.registered {
            assignments.push((COL_REGISTERED, SqlParam::Bool(registered)));
        }
        if let Some(kind) = patch.kind {
            assignments.push((COL_COMPANY_TYPE, SqlParam::Kind(kind)));
        }

        assignments.sort_by_key(|(column, _)| *column);

        let set_clause = assignments
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{column} = ${}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let key_position = assignments.len() + 1;

        let mut params: Vec<SqlParam> = assignments.into_iter().map(|(_, p)| p).collect();
        params.push(SqlParam::Text(id.to_string()));

        Ok(Statement {
            operation,
            sql: format!(
                "UPDATE {COMPANIES_TABLE} SET {set_clause} WHERE {COL_ID} = ${key_position} RETURNING {}",
                COLUMNS.join(", ")
            ),
            params,
            key: Some(id.to_string()),
        })
    }

    /// Build a `DELETE ... RETURNING` so the removed row can be captured.
    pub fn delete(id: &str) -> Result<Statement, StoreError> {
        let operation = OperationKind::Delete;
        let id = require_key(operation, id)?;

        Ok(Statement {
            operation,
            sql: format!(
                "DELETE FROM {COMPANIES_TABLE} WHERE {COL_ID} = $1 RETURNING {}",
                COLUMNS.join(", ")
            ),
            params: vec![SqlParam::Text(id.to_string())],
            key: Some(id.to_string()),
        })
    }
}

fn require_key(operation: OperationKind, id: &str) -> Result<&str, StoreError> {
    if id.trim().is_empty() {
        Err(StoreError::MissingKey { operation })
    } else {
        Ok(id)
    }
}

fn check_name(operation: OperationKind, name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidInput {
            operation,
            reason: "name must not be empty".to_string(),
        });
    }
    Ok(())
}

fn check_employee_count(operation: OperationKind, count: i32) -> Result<(), StoreError> {
    if count < 0 {
        return Err(StoreError::InvalidInput {
            operation,
            reason: format!("employee_count must not be negative, got {count}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::companies::models::CompanyPatch;

    fn acme() -> Company {
        Company {
            id: "c1".to_string(),
            name: "Acme".to_string(),
            description: None,
            employee_count: 5,
            registered: true,
            kind: CompanyKind::Corporation,
        }
    }

    #[test]
    fn test_insert_binds_in_column_order() {
        let statement = QueryBuilder::insert(&acme()).unwrap();

        assert_eq!(
            statement.sql,
            "INSERT INTO companies (id, name, description, employee_count, registered, company_type) \
             VALUES ($1, $2, $3, $4, $5, $6)"
        );
        assert_eq!(
            statement.params,
            vec![
                SqlParam::Text("c1".to_string()),
                SqlParam::Text("Acme".to_string()),
                SqlParam::NullableText(None),
                SqlParam::Int(5),
                SqlParam::Bool(true),
                SqlParam::Kind(CompanyKind::Corporation),
            ]
        );
        assert_eq!(statement.key.as_deref(), Some("c1"));
    }

    #[test]
    fn test_insert_requires_key() {
        let company = Company {
            id: String::new(),
            ..acme()
        };
        let err = QueryBuilder::insert(&company).unwrap_err();
        assert!(matches!(
            err,
            StoreError::MissingKey {
                operation: OperationKind::Insert
            }
        ));
    }

    #[test]
    fn test_insert_rejects_empty_name_and_negative_count() {
        let unnamed = Company {
            name: "  ".to_string(),
            ..acme()
        };
        assert!(matches!(
            QueryBuilder::insert(&unnamed).unwrap_err(),
            StoreError::InvalidInput { .. }
        ));

        let negative = Company {
            employee_count: -1,
            ..acme()
        };
        assert!(matches!(
            QueryBuilder::insert(&negative).unwrap_err(),
            StoreError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_select_all_and_by_id() {
        let all = QueryBuilder::select(&SelectFilter::All).unwrap();
        assert!(!all.sql.contains("WHERE"));
        assert!(all.params.is_empty());
        assert_eq!(all.key, None);

        let one = QueryBuilder::select(&SelectFilter::ById("c1".to_string())).unwrap();
        assert!(one.sql.ends_with("WHERE id = $1"));
        assert_eq!(one.params, vec![SqlParam::Text("c1".to_string())]);

        let err = QueryBuilder::select(&SelectFilter::ById(String::new())).unwrap_err();
        assert!(matches!(err, StoreError::MissingKey { .. }));
    }

    #[test]
    fn test_update_orders_assignments_and_params_together() {
        let request = MutationRequest::new(
            "c1",
            CompanyPatch {
                registered: Some(false),
                name: Some("Acme Holdings".to_string()),
                kind: Some(CompanyKind::Cooperative),
                ..Default::default()
            },
        );

        let statement = QueryBuilder::update(&request).unwrap();

        assert_eq!(
            statement.sql,
            "UPDATE companies SET company_type = $1, name = $2, registered = $3 \
             WHERE id = $4 RETURNING id, name, description, employee_count, registered, company_type"
        );
        assert_eq!(
            statement.params,
            vec![
                SqlParam::Kind(CompanyKind::Cooperative),
                SqlParam::Text("Acme Holdings".to_string()),
                SqlParam::Bool(false),
                SqlParam::Text("c1".to_string()),
            ]
        );
    }

    #[test]
    fn test_update_can_clear_description() {
        let request = MutationRequest::new(
            "c1",
            CompanyPatch {
                description: Some(None),
                ..Default::default()
            },
        );

        let statement = QueryBuilder::update(&request).unwrap();
        assert!(statement.sql.starts_with("UPDATE companies SET description = $1 WHERE id = $2"));
        assert_eq!(statement.params[0], SqlParam::NullableText(None));
    }

    #[test]
    fn test_update_without_key_is_missing_key() {
        let request = MutationRequest {
            id: None,
            patch: CompanyPatch {
                name: Some("Acme".to_string()),
                ..Default::default()
            },
        };
        let err = QueryBuilder::update(&request).unwrap_err();
        assert!(matches!(
            err,
            StoreError::MissingKey {
                operation: OperationKind::Update
            }
        ));
    }

    #[test]
    fn test_update_with_only_key_is_invalid_arg() {
        let request = MutationRequest::new("c1", CompanyPatch::default());
        let err = QueryBuilder::update(&request).unwrap_err();
        assert!(matches!(err, StoreError::InvalidArg { .. }));
    }

    #[test]
    fn test_update_validates_values() {
        let request = MutationRequest::new(
            "c1",
            CompanyPatch {
                name: Some(String::new()),
                ..Default::default()
            },
        );
        assert!(matches!(
            QueryBuilder::update(&request).unwrap_err(),
            StoreError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_delete_returns_removed_row() {
        let statement = QueryBuilder::delete("c1").unwrap();
        assert_eq!(
            statement.sql,
            "DELETE FROM companies WHERE id = $1 RETURNING id, name, description, employee_count, registered, company_type"
        );
        assert_eq!(statement.params, vec![SqlParam::Text("c1".to_string())]);

        assert!(matches!(
            QueryBuilder::delete("").unwrap_err(),
            StoreError::MissingKey { .. }
        ));
    }

    #[test]
    fn test_arguments_accept_every_param_kind() {
        let statement = QueryBuilder::insert(&acme()).unwrap();
        assert!(statement.arguments().is_ok());
    }
}
