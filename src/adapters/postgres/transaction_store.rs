use crate::adapters::row::{TransactionRow, into_borrowed, map_insert_error};
use crate::domain::{
    BorrowedTransaction, ContainerId, NewBorrow, ReturnedTransaction, Transaction, TransactionId,
};
use crate::ports::transaction_store::{Result, TransactionStore as TransactionStoreTrait};
use async_trait::async_trait;
use sqlx::PgPool;

/// TransactionStoreのPostgreSQL実装
///
/// 同一容器の貸出中記録の重複は部分ユニークインデックス
/// `ux_transactions_active_container` で防ぐ。
pub struct TransactionStore {
    pool: PgPool,
}

impl TransactionStore {
    /// PostgreSQLコネクションプールから新しいTransactionStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `migrations/postgres` のマイグレーションを適用する
pub async fn run_migrations(pool: &PgPool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations/postgres").run(pool).await
}

#[async_trait]
impl TransactionStoreTrait for TransactionStore {
    /// 容器の貸出中の記録を取得
    ///
    /// (container_id) WHERE status = 'BORROWED' の部分インデックスを使用。
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
            WHERE container_id = $1 AND status = 'BORROWED'
            "#,
        )
        .bind(container_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_borrowed).transpose()
    }

    /// 貸出記録を挿入
    ///
    /// IDとDB側で丸められたborrow_time（マイクロ秒精度）を
    /// RETURNINGで取得して返す。
    async fn insert_borrowed(&self, new_borrow: NewBorrow) -> Result<BorrowedTransaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (
                user_id,
                container_id,
                borrow_time,
                status
            )
            VALUES ($1, $2, $3, 'BORROWED')
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

    /// 返却済みに更新
    ///
    /// BORROWEDの行のみ更新するため、同時返却でも更新は1回だけ成功する。
    async fn mark_returned(&self, returned: &ReturnedTransaction) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = 'RETURNED',
                return_time = $1
            WHERE id = $2 AND status = 'BORROWED'
            "#,
        )
        .bind(returned.return_time)
        .bind(returned.id.value())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// IDで記録を取得
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
            WHERE id = $1
            "#,
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Transaction::try_from).transpose()
    }

    /// 容器の全記録を新しい順に取得（貸出履歴）
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
            WHERE container_id = $1
            ORDER BY id DESC
            "#,
        )
        .bind(container_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }
}
