use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use super::query_builder::{QueryBuilder, SelectFilter, SqlParam, Statement};
use crate::domains::companies::models::{Company, MutationRequest};
use crate::kernel::store::{OperationKind, Store, StoreError};

/// One executed statement, kept for latency diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryLogEntry {
    pub statement: String,
    pub params: Vec<SqlParam>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl QueryLogEntry {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// A single request's handle on the `companies` table.
///
/// Each operation is prepared, then executed exactly once. The rows produced
/// by the last execute stay buffered until the next prepare. A connection is
/// borrowed from the pool for the duration of one execute only.
///
/// Entities are request-local and never shared between tasks.
pub struct CompanyEntity {
    pool: Option<PgPool>,
    pending: Option<Statement>,
    rows: Vec<Company>,
    query_log: Vec<QueryLogEntry>,
}

impl CompanyEntity {
    pub fn new(store: &Store) -> Self {
        Self {
            pool: store.pool().ok().cloned(),
            pending: None,
            rows: Vec::new(),
            query_log: Vec::new(),
        }
    }

    pub fn prepare_insert(&mut self, company: &Company) -> Result<(), StoreError> {
        self.prepare(QueryBuilder::insert(company))
    }

    pub fn prepare_select(&mut self, filter: &SelectFilter) -> Result<(), StoreError> {
        self.prepare(QueryBuilder::select(filter))
    }

    pub fn prepare_update(&mut self, request: &MutationRequest) -> Result<(), StoreError> {
        self.prepare(QueryBuilder::update(request))
    }

    pub fn prepare_delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.prepare(QueryBuilder::delete(id))
    }

    fn prepare(&mut self, statement: Result<Statement, StoreError>) -> Result<(), StoreError> {
        self.rows.clear();
        self.pending = None;
        self.pending = Some(statement?);
        Ok(())
    }

    /// Run the prepared statement.
    ///
    /// Zero matching rows on a keyed statement is `StoreError::NotFound`. The
    /// statement is logged whenever a connection was obtained, whatever the
    /// outcome of the statement itself.
    pub async fn execute(&mut self) -> Result<(), StoreError> {
        let pool = self.pool.clone().ok_or(StoreError::NotConnected)?;
        let statement = self.pending.take().ok_or(StoreError::NotPrepared)?;

        let started_at = Utc::now();
        let mut conn = pool.acquire().await?;
        let outcome = run(&statement, &mut conn).await;
        drop(conn);
        let finished_at = Utc::now();

        self.query_log.push(QueryLogEntry {
            statement: statement.sql,
            params: statement.params,
            started_at,
            finished_at,
        });

        self.rows = outcome?;
        Ok(())
    }

    /// Rows returned by the last successful execute.
    pub fn value(&self) -> &[Company] {
        &self.rows
    }

    /// First row returned by the last successful execute.
    pub fn row(&self) -> Option<&Company> {
        self.rows.first()
    }

    pub fn into_rows(self) -> Vec<Company> {
        self.rows
    }

    pub fn query_log(&self) -> &[QueryLogEntry] {
        &self.query_log
    }

    /// Emit the query trail at debug level.
    pub fn log_queries(&self) {
        for entry in &self.query_log {
            debug!(
                elapsed_us = entry.elapsed().num_microseconds().unwrap_or(i64::MAX),
                sql = %entry.statement,
                params = ?entry.params,
                "[DB]"
            );
        }
    }
}

async fn run(statement: &Statement, conn: &mut PgConnection) -> Result<Vec<Company>, StoreError> {
    let arguments = statement.arguments()?;
    let not_found = || StoreError::NotFound {
        operation: statement.operation,
        id: statement.key.clone().unwrap_or_default(),
    };

    match statement.operation {
        OperationKind::Insert => {
            sqlx::query_with(&statement.sql, arguments)
                .execute(&mut *conn)
                .await?;
            Ok(Vec::new())
        }
        OperationKind::Select => {
            let rows = sqlx::query_as_with::<_, Company, _>(&statement.sql, arguments)
                .fetch_all(&mut *conn)
                .await?;
            if rows.is_empty() && statement.key.is_some() {
                return Err(not_found());
            }
            Ok(rows)
        }
        OperationKind::Update | OperationKind::Delete => {
            sqlx::query_as_with::<_, Company, _>(&statement.sql, arguments)
                .fetch_optional(&mut *conn)
                .await?
                .map(|row| vec![row])
                .ok_or_else(not_found)
        }
    }
}
