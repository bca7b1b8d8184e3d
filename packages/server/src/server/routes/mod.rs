// HTTP routes
pub mod auth;
pub mod companies;
pub mod health;

pub use auth::*;
pub use companies::*;
pub use health::*;
