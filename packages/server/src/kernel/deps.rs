//! Server dependencies for actions
//!
//! This module provides the dependency container handed to every domain
//! action. The broker sits behind a trait so tests can swap in `TestBroker`.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domains::auth::{AdminCredentials, JwtService};
use crate::kernel::publisher::{Broker, Publisher};
use crate::kernel::store::Store;

/// Server dependencies accessible to actions
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Store,
    pub publisher: Arc<Publisher>,
    /// JWT service for token creation
    pub jwt_service: Arc<JwtService>,
    pub admin: AdminCredentials,
}

impl ServerDeps {
    pub fn new(
        store: Store,
        publisher: Arc<Publisher>,
        jwt_service: Arc<JwtService>,
        admin: AdminCredentials,
    ) -> Self {
        Self {
            store,
            publisher,
            jwt_service,
            admin,
        }
    }

    /// Dependencies backed by the given store and an in-memory broker.
    pub fn for_tests(store: Store, broker: Arc<dyn Broker>) -> Self {
        let shutdown = CancellationToken::new();
        Self {
            store,
            publisher: Arc::new(Publisher::new(broker, &shutdown)),
            jwt_service: Arc::new(JwtService::new("test_secret_key", "test_issuer".to_string())),
            admin: AdminCredentials::new("admin", "admin-password"),
        }
    }
}
