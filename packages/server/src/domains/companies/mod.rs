//! Companies domain - the single record type managed by the service
//!
//! Every mutation is written to PostgreSQL first and then announced on the
//! broker. When the announcement cannot be confirmed the write is reverted
//! with a compensating statement (see `actions::compensation`).

pub mod actions;
pub mod errors;
pub mod models;
pub mod store;

pub use errors::CompanyError;
pub use models::{Company, CompanyEvent, CompanyKind, CompanyPatch, EventOp, MutationRequest};
pub use store::CompanyEntity;
