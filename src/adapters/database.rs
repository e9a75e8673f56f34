use crate::adapters::postgres::{self, PostgresTransactionStore};
use crate::adapters::sqlite::{self, SqliteTransactionStore};
use crate::config::{ConfigError, DatabaseBackend};
use crate::ports::TransactionStore;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// データベース初期化のエラー
#[derive(Debug, Error)]
pub enum DatabaseSetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to connect to database")]
    Connect(#[source] sqlx::Error),

    #[error("Failed to run migrations")]
    Migrate(#[source] sqlx::migrate::MigrateError),
}

/// URLから永続化エンジンを選び、マイグレーション済みのストアを返す
///
/// - postgres:// / postgresql:// → PostgreSQL
/// - sqlite: → SQLite（ファイルが無ければ作成）
pub async fn connect_transaction_store(
    database_url: &str,
    max_connections: u32,
) -> Result<Arc<dyn TransactionStore>, DatabaseSetupError> {
    match DatabaseBackend::from_url(database_url)? {
        DatabaseBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(max_connections)
                .connect(database_url)
                .await
                .map_err(DatabaseSetupError::Connect)?;

            postgres::transaction_store::run_migrations(&pool)
                .await
                .map_err(DatabaseSetupError::Migrate)?;

            tracing::info!("Connected to PostgreSQL transaction store");
            Ok(Arc::new(PostgresTransactionStore::new(pool)))
        }
        DatabaseBackend::Sqlite => {
            let pool = connect_sqlite(database_url, max_connections).await?;

            sqlite::transaction_store::run_migrations(&pool)
                .await
                .map_err(DatabaseSetupError::Migrate)?;

            tracing::info!("Connected to SQLite transaction store");
            Ok(Arc::new(SqliteTransactionStore::new(pool)))
        }
    }
}

/// SQLiteプールを作成する
///
/// インメモリDBは接続ごとに別のDBになるため、接続を1本に固定し
/// プールから破棄されないようにする。
pub async fn connect_sqlite(
    database_url: &str,
    max_connections: u32,
) -> Result<sqlx::SqlitePool, DatabaseSetupError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(DatabaseSetupError::Connect)?
        .create_if_missing(true);

    let pool_options = if is_in_memory(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections)
    };

    pool_options
        .connect_with(options)
        .await
        .map_err(DatabaseSetupError::Connect)
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}
