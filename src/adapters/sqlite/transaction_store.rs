use crate::adapters::row::{TransactionRow, into_borrowed, map_insert_error};
use crate::domain::{
    BorrowedTransaction, ContainerId, NewBorrow, ReturnedTransaction, Transaction, TransactionId,
};
use crate::ports::transaction_store::{Result, TransactionStore as TransactionStoreTrait};
use async_trait::async_trait;
use sqlx::SqlitePool;

/// TransactionStoreのSQLite実装
///
/// ローカル開発・デモ用の組み込みストア。
/// スキーマと制約はPostgreSQL版と同じ（部分ユニークインデックスを含む）。
pub struct TransactionStore {
    pool: SqlitePool,
}

impl TransactionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// `migrations/sqlite` のマイグレーションを適用する
pub async fn run_migrations(
    pool: &SqlitePool,
) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations/sqlite").run(pool).await
}

#[async_trait]
impl TransactionStoreTrait for TransactionStore {
    async fn find_active(
        &self,
        container_id: &ContainerId,
    ) -> Result<Option<BorrowedTransaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT
                id,
                user_id,
                container_id,
                borrow_time,
                return_time,
                status
            FROM transactions
            WHERE container_id = ? AND status = 'BORROWED'
            "#,
        )
        .bind(container_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_borrowed).transpose()
    }

    async fn insert_borrowed(&self, new_borrow: NewBorrow) -> Result<BorrowedTransaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (
                user_id,
                container_id,
                borrow_time,
                status
            )
            VALUES (?, ?, ?, 'BORROWED')
            RETURNING
                id,
                user_id,
                container_id,
                borrow_time,
                return_time,
                status
            "#,
        )
        .bind(new_borrow.user_id.as_str())
        .bind(new_borrow.container_id.as_str())
        .bind(new_borrow.borrow_time)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, &new_borrow.container_id))?;

        into_borrowed(row)
    }

    async fn mark_returned(&self, returned: &ReturnedTransaction) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = 'RETURNED',
                return_time = ?
            WHERE id = ? AND status = 'BORROWED'
            "#,
        )
        .bind(returned.return_time)
        .bind(returned.id.value())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_by_id(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT
                id,
                user_id,
                container_id,
                borrow_time,
                return_time,
                status
            FROM transactions
            WHERE id = ?
            "#,
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Transaction::try_from).transpose()
    }

    async fn find_by_container(&self, container_id: &ContainerId) -> Result<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT
                id,
                user_id,
                container_id,
                borrow_time,
                return_time,
                status
            FROM transactions
            WHERE container_id = ?
            ORDER BY id DESC
            "#,
        )
        .bind(container_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }
}
