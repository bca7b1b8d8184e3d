// Company Service - API Core
//
// Exposes the company record over REST, backed by PostgreSQL, and announces
// every mutation on NATS JetStream. A mutation whose event cannot be confirmed
// is undone with a compensating store operation.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
