//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod publisher;
pub mod store;

pub use deps::ServerDeps;
pub use publisher::{
    Broker, BrokerError, DeliveryReport, OutboundEvent, OutboundMessage, PublishError, Publisher,
    RetryPolicy, TestBroker,
};
pub use store::{OperationKind, Store, StoreError};
