use futures::future::BoxFuture;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, RuntimeErr, SqlErr, TransactionTrait};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, warn};

/// Failure classes surfaced by every catalog operation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Unique constraint on title or storage id. Never retried.
    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    /// Lock contention that outlived the busy timeout and every retry.
    #[error("Database busy: {0}")]
    Busy(String),

    #[error("Database error: {0}")]
    Database(DbErr),
}

impl StoreError {
    pub fn is_busy(&self) -> bool {
        matches!(self, StoreError::Busy(_))
    }
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(msg)) = err.sql_err() {
            return StoreError::Duplicate(msg);
        }
        if is_lock_error(&err) {
            return StoreError::Busy(err.to_string());
        }
        StoreError::Database(err)
    }
}

// SQLITE_BUSY, SQLITE_LOCKED and their extended codes
const LOCK_CODES: &[&str] = &["5", "6", "261", "262", "517"];

fn is_lock_error(err: &DbErr) -> bool {
    if let DbErr::ConnectionAcquire(_) = err {
        return true;
    }

    if let Some(code) = sqlite_code(err) {
        if LOCK_CODES.contains(&code.as_str()) {
            return true;
        }
    }

    let msg = err.to_string().to_lowercase();
    msg.contains("database is locked") || msg.contains("database table is locked")
}

fn sqlite_code(err: &DbErr) -> Option<String> {
    let runtime = match err {
        DbErr::Conn(e) | DbErr::Exec(e) | DbErr::Query(e) => e,
        _ => return None,
    };
    match runtime {
        RuntimeErr::SqlxError(sqlx_err) => sqlx_err
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .map(|code| code.into_owned()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Wait before the attempt following `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt
    }
}

/// Runs store operations under one connection/transaction per attempt,
/// retrying on lock contention and committing exactly once on success.
#[derive(Clone)]
pub struct Executor {
    db: DatabaseConnection,
    policy: RetryPolicy,
}

impl Executor {
    pub fn new(db: DatabaseConnection, policy: RetryPolicy) -> Self {
        Self { db, policy }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn run<T, F>(&self, op_name: &'static str, op: F) -> Result<T, StoreError>
    where
        T: Send,
        F: for<'c> Fn(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, StoreError>>
            + Send
            + Sync,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(&op).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_busy() && attempt < self.policy.max_attempts => {
                    let wait = self.policy.backoff(attempt);
                    warn!(
                        "🔒 Database locked during {}, retry {} in {:?}",
                        op_name, attempt, wait
                    );
                    sleep(wait).await;
                }
                Err(StoreError::Duplicate(msg)) => return Err(StoreError::Duplicate(msg)),
                Err(err) => {
                    error!(
                        "❌ Database operation {} failed (attempt {}): {}",
                        op_name, attempt, err
                    );
                    return Err(err);
                }
            }
        }
    }

    async fn attempt<T, F>(&self, op: &F) -> Result<T, StoreError>
    where
        F: for<'c> Fn(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, StoreError>>,
    {
        let txn = self.db.begin().await?;

        match op(&txn).await {
            Ok(value) => {
                txn.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!("Rollback failed: {}", rollback_err);
                }
                Err(err)
            }
        }
    }
}
