//! Dual-write bookkeeping: publish after a store mutation, undo on failure.
//!
//! ```text
//! Start -> StoreMutated -> Published
//!                       -> PublishFailed -> Compensated
//!                                        -> CompensationFailed
//! ```

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::domains::companies::errors::CompanyError;
use crate::domains::companies::models::{Company, CompanyEvent, EventOp, MutationRequest};
use crate::domains::companies::store::CompanyEntity;
use crate::kernel::store::StoreError;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DualWriteState {
    Start,
    StoreMutated,
    Published,
    PublishFailed,
    Compensated,
    CompensationFailed,
}

impl fmt::Display for DualWriteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DualWriteState::Start => "start",
            DualWriteState::StoreMutated => "store_mutated",
            DualWriteState::Published => "published",
            DualWriteState::PublishFailed => "publish_failed",
            DualWriteState::Compensated => "compensated",
            DualWriteState::CompensationFailed => "compensation_failed",
        };
        f.write_str(name)
    }
}

pub(super) fn transition(company_id: &str, op: EventOp, state: DualWriteState) {
    debug!(company_id, op = %op, state = %state, "Dual write transition");
}

/// The store operation that reverts a mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Compensation {
    /// Undo an insert.
    Delete(String),
    /// Undo a delete with the captured row.
    Reinsert(Company),
    /// Undo an update by rewriting every column of the captured row.
    Restore(Company),
}

impl Compensation {
    async fn apply(&self, entity: &mut CompanyEntity) -> Result<(), StoreError> {
        match self {
            Compensation::Delete(id) => entity.prepare_delete(id)?,
            Compensation::Reinsert(company) => entity.prepare_insert(company)?,
            Compensation::Restore(company) => {
                entity.prepare_update(&MutationRequest::restore(company))?
            }
        }
        entity.execute().await
    }
}

/// Publish `event` for a mutation that is already committed.
///
/// On publish failure `undo` runs on the same entity. A failed undo is logged
/// and the caller still gets the publish error.
pub(super) async fn publish_or_compensate(
    entity: &mut CompanyEntity,
    deps: &ServerDeps,
    event: CompanyEvent,
    undo: Compensation,
) -> Result<(), CompanyError> {
    let op = event.op();
    let company_id = event.company().id.clone();
    transition(&company_id, op, DualWriteState::StoreMutated);

    let err = match deps
        .publisher
        .publish_batch_with_retry(std::slice::from_ref(&event))
        .await
    {
        Ok(()) => {
            transition(&company_id, op, DualWriteState::Published);
            return Ok(());
        }
        Err(err) => err,
    };

    transition(&company_id, op, DualWriteState::PublishFailed);
    warn!(company_id, op = %op, error = %err, "Event not delivered, compensating");

    match undo.apply(entity).await {
        Ok(()) => {
            transition(&company_id, op, DualWriteState::Compensated);
            info!(company_id, op = %op, "Compensation applied");
        }
        Err(compensation_error) => {
            transition(&company_id, op, DualWriteState::CompensationFailed);
            error!(
                company_id,
                op = %op,
                error = %compensation_error,
                "Compensation failed, store and broker disagree"
            );
        }
    }

    Err(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;

    use crate::domains::companies::models::CompanyKind;
    use crate::kernel::publisher::{PublishError, Publisher, RetryPolicy, TestBroker};
    use crate::kernel::store::Store;

    fn acme() -> Company {
        Company {
            id: "c1".to_string(),
            name: "Acme".to_string(),
            description: None,
            employee_count: 1,
            registered: false,
            kind: CompanyKind::Corporation,
        }
    }

    fn deps_with(broker: &Arc<TestBroker>) -> ServerDeps {
        let mut deps = ServerDeps::for_tests(Store::disconnected(), broker.clone());
        let publisher = Publisher::new(broker.clone(), &CancellationToken::new())
            .with_retry_policy(RetryPolicy {
                max_attempts: 1,
                ..Default::default()
            });
        deps.publisher = Arc::new(publisher);
        deps
    }

    #[tokio::test]
    async fn test_published_event_skips_compensation() {
        let broker = Arc::new(TestBroker::new());
        let deps = deps_with(&broker);
        let mut entity = CompanyEntity::new(&deps.store);

        publish_or_compensate(
            &mut entity,
            &deps,
            CompanyEvent::new(acme(), EventOp::Insert),
            Compensation::Delete("c1".to_string()),
        )
        .await
        .unwrap();

        assert_eq!(broker.messages_for_key("c1").len(), 1);
        assert!(entity.query_log().is_empty());
    }

    #[tokio::test]
    async fn test_failed_compensation_keeps_publish_error() {
        let broker = Arc::new(TestBroker::new());
        broker.set_outage(true);
        let deps = deps_with(&broker);
        // Disconnected store: the compensating delete cannot run
        let mut entity = CompanyEntity::new(&deps.store);

        let err = publish_or_compensate(
            &mut entity,
            &deps,
            CompanyEvent::new(acme(), EventOp::Insert),
            Compensation::Delete("c1".to_string()),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            CompanyError::Publish(PublishError::Exhausted { attempts: 1, .. })
        ));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(DualWriteState::StoreMutated.to_string(), "store_mutated");
        assert_eq!(
            DualWriteState::CompensationFailed.to_string(),
            "compensation_failed"
        );
    }
}
