//! Statement building and execution for the company record.

pub mod entity;
pub mod query_builder;

pub use entity::{CompanyEntity, QueryLogEntry};
pub use query_builder::{QueryBuilder, SelectFilter, SqlParam, Statement, COMPANIES_TABLE};
