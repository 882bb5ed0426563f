use crate::config::BotConfig;
use crate::entities::{images, metadata, prelude::*};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema, Set, SqlxSqliteConnector,
    Statement, TransactionTrait,
};
use sqlx::ConnectOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::time::Duration;
use tracing::info;

/// Target for `PRAGMA user_version`.
pub const SCHEMA_VERSION: i32 = 1;

/// Marker stored in the metadata table on first start.
pub const SCHEMA_MARKER: &str = "1.1";

/// Columns added after the first release; applied when missing.
const ADDITIVE_COLUMNS: &[(&str, &str)] = &[
    ("uploader_id", "ALTER TABLE images ADD COLUMN uploader_id INTEGER"),
    ("last_accessed", "ALTER TABLE images ADD COLUMN last_accessed TEXT"),
];

pub async fn setup_database(config: &BotConfig) -> anyhow::Result<DatabaseConnection> {
    info!("📂 Database: {}", config.db_path);

    let db = connect(
        &config.db_path,
        config.busy_timeout(),
        config.db_max_connections,
    )
    .await?;

    info!("✅ Database connected successfully");

    init_schema(&db).await?;
    let version = migrate(&db).await?;
    info!("✅ Database initialized (schema version {})", version);

    Ok(db)
}

/// Opens a SQLite pool with WAL journaling and a busy timeout on every connection.
/// `:memory:` gets a single connection that is never recycled.
pub async fn connect(
    path: &str,
    busy_timeout: Duration,
    max_connections: u32,
) -> anyhow::Result<DatabaseConnection> {
    let in_memory = path == ":memory:";

    let base = if in_memory {
        SqliteConnectOptions::new().in_memory(true)
    } else {
        SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
    };

    let options = base
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(busy_timeout)
        .log_statements(log::LevelFilter::Debug);

    let mut pool_options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(30));
    pool_options = if in_memory {
        pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        pool_options
            .max_connections(max_connections.max(1))
            .idle_timeout(Duration::from_secs(600))
    };

    let pool = pool_options.connect_with(options).await?;
    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// Creates tables and indexes if absent and seeds the schema marker. Idempotent.
pub async fn init_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    info!("🔄 Checking database schema...");

    let stmts = vec![
        (
            "images",
            schema
                .create_table_from_entity(images::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "metadata",
            schema
                .create_table_from_entity(metadata::Entity)
                .if_not_exists()
                .to_owned(),
        ),
    ];

    for (name, stmt) in stmts {
        db.execute(builder.build(&stmt)).await?;
        info!("   - Table '{}' checked/created", name);
    }

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_storage_file_id ON images(storage_file_id)",
        "CREATE INDEX IF NOT EXISTS idx_upload_time ON images(upload_time)",
    ];
    for sql in indexes {
        db.execute(Statement::from_string(builder, sql.to_owned()))
            .await?;
    }

    let seeded = Metadata::insert(metadata::ActiveModel {
        key: Set("schema_version".to_string()),
        value: Set(Some(SCHEMA_MARKER.to_string())),
    })
    .on_conflict(
        OnConflict::column(metadata::Column::Key)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(db)
    .await?;
    if seeded > 0 {
        info!("   - Seeded schema marker {}", SCHEMA_MARKER);
    }

    Ok(())
}

/// Brings `PRAGMA user_version` up to [`SCHEMA_VERSION`], adding any missing
/// columns on the way. Returns the resulting version.
pub async fn migrate(db: &DatabaseConnection) -> Result<i32, DbErr> {
    let builder = db.get_database_backend();
    let version = user_version(db).await?;

    if version >= SCHEMA_VERSION {
        return Ok(version);
    }

    info!(
        "🔄 Migrating database from version {} to {}",
        version, SCHEMA_VERSION
    );

    let txn = db.begin().await?;

    let existing: Vec<String> = txn
        .query_all(Statement::from_string(
            builder,
            "PRAGMA table_info(images)".to_owned(),
        ))
        .await?
        .iter()
        .filter_map(|row| row.try_get::<String>("", "name").ok())
        .collect();

    for (column, ddl) in ADDITIVE_COLUMNS {
        if existing.iter().any(|c| c == column) {
            continue;
        }
        txn.execute(Statement::from_string(builder, (*ddl).to_owned()))
            .await?;
        info!("   - Added column images.{}", column);
    }

    txn.execute(Statement::from_string(
        builder,
        format!("PRAGMA user_version = {}", SCHEMA_VERSION),
    ))
    .await?;
    txn.commit().await?;

    info!("✅ Database migrated to version {}", SCHEMA_VERSION);
    Ok(SCHEMA_VERSION)
}

pub async fn user_version(db: &impl ConnectionTrait) -> Result<i32, DbErr> {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            "PRAGMA user_version".to_owned(),
        ))
        .await?;

    match row {
        Some(row) => row.try_get::<i32>("", "user_version"),
        None => Ok(0),
    }
}
