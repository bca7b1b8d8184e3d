//! Store behavior against a real PostgreSQL.

mod common;

use company_core::domains::companies::actions::{
    delete_company, get_company, insert_company, list_companies, update_company,
};
use company_core::domains::companies::store::SelectFilter;
use company_core::domains::companies::{
    CompanyEntity, CompanyError, CompanyKind, CompanyPatch, MutationRequest,
};
use company_core::kernel::{OperationKind, StoreError};
use test_context::test_context;

use crate::common::{company, unknown_id, TestHarness};

fn store_error(err: CompanyError) -> StoreError {
    match err {
        CompanyError::Store(e) => e,
        other => panic!("expected store error, got {other}"),
    }
}

#[test_context(TestHarness)]
#[tokio::test]
async fn insert_then_select_returns_equal_company(ctx: &TestHarness) {
    let acme = company("Acme");

    let inserted = insert_company(acme.clone(), &ctx.deps).await.unwrap();
    assert_eq!(inserted, acme);

    let fetched = get_company(&acme.id, &ctx.deps).await.unwrap();
    assert_eq!(fetched, acme);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn insert_assigns_missing_id(ctx: &TestHarness) {
    let mut anon = company("Anon");
    anon.id = String::new();

    let inserted = insert_company(anon, &ctx.deps).await.unwrap();
    assert!(uuid::Uuid::parse_str(&inserted.id).is_ok());

    let fetched = get_company(&inserted.id, &ctx.deps).await.unwrap();
    assert_eq!(fetched.name, "Anon");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn cooperative_kind_round_trips(ctx: &TestHarness) {
    let mut coop = company("Coop");
    coop.kind = CompanyKind::Cooperative;
    insert_company(coop.clone(), &ctx.deps).await.unwrap();

    let fetched = get_company(&coop.id, &ctx.deps).await.unwrap();
    assert_eq!(fetched.kind, CompanyKind::Cooperative);

    let json = serde_json::to_value(&fetched).unwrap();
    assert_eq!(json["type"], "cooperative");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn missing_ids_are_not_found(ctx: &TestHarness) {
    let id = unknown_id();

    let err = store_error(get_company(&id, &ctx.deps).await.unwrap_err());
    assert!(matches!(
        err,
        StoreError::NotFound { operation: OperationKind::Select, ref id } if !id.is_empty()
    ));

    let err = store_error(delete_company(&id, &ctx.deps).await.unwrap_err());
    assert!(matches!(err, StoreError::NotFound { operation: OperationKind::Delete, .. }));

    let patch = CompanyPatch {
        name: Some("Ghost".to_string()),
        ..Default::default()
    };
    let err = store_error(
        update_company(&id, MutationRequest { id: None, patch }, &ctx.deps)
            .await
            .unwrap_err(),
    );
    assert!(err.is_not_found());

    // No mutation happened, so nothing was announced
    assert!(ctx.broker.messages_for_key(&id).is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn update_changes_only_named_columns(ctx: &TestHarness) {
    let acme = company("Acme");
    insert_company(acme.clone(), &ctx.deps).await.unwrap();

    let request = MutationRequest::from_value(serde_json::json!({
        "employee_count": 40,
        "description": null,
    }))
    .unwrap();
    let updated = update_company(&acme.id, request, &ctx.deps).await.unwrap();

    assert_eq!(updated.employee_count, 40);
    assert_eq!(updated.description, None);
    assert_eq!(updated.name, acme.name);
    assert_eq!(updated.kind, acme.kind);
    assert_eq!(get_company(&acme.id, &ctx.deps).await.unwrap(), updated);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn update_key_is_validated_before_store(ctx: &TestHarness) {
    let acme = company("Acme");
    insert_company(acme.clone(), &ctx.deps).await.unwrap();

    let conflicting = MutationRequest::new(
        unknown_id(),
        CompanyPatch {
            name: Some("Other".to_string()),
            ..Default::default()
        },
    );
    let err = store_error(
        update_company(&acme.id, conflicting, &ctx.deps)
            .await
            .unwrap_err(),
    );
    assert!(matches!(err, StoreError::InvalidInput { .. }));

    let mut entity = CompanyEntity::new(&ctx.store);
    let keyless = MutationRequest {
        id: None,
        patch: CompanyPatch {
            name: Some("Other".to_string()),
            ..Default::default()
        },
    };
    let err = entity.prepare_update(&keyless).unwrap_err();
    assert!(matches!(err, StoreError::MissingKey { .. }));
    assert!(entity.query_log().is_empty());

    assert_eq!(get_company(&acme.id, &ctx.deps).await.unwrap().name, "Acme");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn delete_returns_removed_row(ctx: &TestHarness) {
    let acme = company("Acme");
    insert_company(acme.clone(), &ctx.deps).await.unwrap();

    let removed = delete_company(&acme.id, &ctx.deps).await.unwrap();
    assert_eq!(removed, acme);

    let err = store_error(get_company(&acme.id, &ctx.deps).await.unwrap_err());
    assert!(err.is_not_found());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn list_includes_inserted_companies(ctx: &TestHarness) {
    let first = company("First");
    let second = company("Second");
    insert_company(first.clone(), &ctx.deps).await.unwrap();
    insert_company(second.clone(), &ctx.deps).await.unwrap();

    let all = list_companies(&ctx.deps).await.unwrap();
    let first_at = all.iter().position(|c| c.id == first.id).unwrap();
    let second_at = all.iter().position(|c| c.id == second.id).unwrap();
    // v7 ids sort by creation time
    assert!(first_at < second_at);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn entity_logs_each_executed_statement(ctx: &TestHarness) {
    let acme = company("Acme");
    let mut entity = CompanyEntity::new(&ctx.store);

    entity.prepare_insert(&acme).unwrap();
    entity.execute().await.unwrap();
    assert!(entity.value().is_empty());

    entity
        .prepare_select(&SelectFilter::ById(acme.id.clone()))
        .unwrap();
    entity.execute().await.unwrap();
    assert_eq!(entity.row(), Some(&acme));

    entity
        .prepare_select(&SelectFilter::ById(unknown_id()))
        .unwrap();
    assert!(entity.execute().await.unwrap_err().is_not_found());
    assert!(entity.value().is_empty());

    let log = entity.query_log();
    assert_eq!(log.len(), 3);
    assert!(log[0].statement.starts_with("INSERT INTO companies"));
    assert!(log.iter().all(|entry| entry.finished_at >= entry.started_at));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn database_constraints_surface_as_driver_errors(ctx: &TestHarness) {
    let acme = company("Acme");
    insert_company(acme.clone(), &ctx.deps).await.unwrap();

    // Same primary key again
    let err = store_error(insert_company(acme, &ctx.deps).await.unwrap_err());
    assert!(matches!(err, StoreError::Database(_)));
}
