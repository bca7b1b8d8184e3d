//! Authentication errors shared by the HTTP layer and the auth domain.

mod errors;

pub use errors::AuthError;
