//! Auth domain - admin login and bearer tokens
//!
//! Responsibilities:
//! - Checking the configured admin credentials
//! - JWT issue and verification

pub mod actions;
pub mod jwt;
pub mod models;

pub use jwt::{Claims, JwtService};
pub use models::{AdminCredentials, LoginRequest};
