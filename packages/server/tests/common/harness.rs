//! Test harness with testcontainers for integration testing.
//!
//! One Postgres container is shared by every test in the binary. It is started
//! and migrated on first use. Tests keep to their own ids so they never see
//! each other's rows.

use std::sync::Arc;

use anyhow::{Context, Result};
use company_core::kernel::{Publisher, RetryPolicy, ServerDeps, Store, TestBroker};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

/// Connections per test pool. Kept small so concurrency tests queue.
pub const POOL_SIZE: u32 = 4;

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Run tests with: RUST_LOG=company_core=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;
        Store::from_pool(pool.clone())
            .migrate()
            .await
            .context("Failed to run migrations")?;
        pool.close().await;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Per-test store, broker and dependency container.
///
/// ```ignore
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     ctx.broker.set_outage(true);
///     // ...
/// }
/// ```
pub struct TestHarness {
    pub pool: PgPool,
    pub store: Store,
    pub broker: Arc<TestBroker>,
    pub deps: ServerDeps,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        self.store.disconnect().await;
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let pool = PgPoolOptions::new()
            .max_connections(POOL_SIZE)
            .connect(&infra.db_url)
            .await
            .context("Failed to connect to test database")?;
        let store = Store::from_pool(pool.clone());

        let broker = Arc::new(TestBroker::new());
        let mut deps = ServerDeps::for_tests(store.clone(), broker.clone());
        // Short backoff keeps outage tests fast
        let retry = RetryPolicy {
            base_delay: std::time::Duration::from_millis(5),
            ..Default::default()
        };
        deps.publisher = Arc::new(
            Publisher::new(broker.clone(), &CancellationToken::new()).with_retry_policy(retry),
        );

        Ok(Self {
            pool,
            store,
            broker,
            deps,
        })
    }

    /// Connections currently checked out of the pool.
    pub fn checked_out(&self) -> usize {
        (self.pool.size() as usize).saturating_sub(self.pool.num_idle())
    }
}
