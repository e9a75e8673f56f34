use crate::domain::{
    BorrowedTransaction, ContainerId, ReturnedTransaction, Transaction, TransactionCore,
    TransactionId, TransactionStatus, UserId,
};
use crate::ports::transaction_store::{Result, TransactionStoreError};
use chrono::{DateTime, Utc};
use std::str::FromStr;

/// `transactions` テーブルの1行
///
/// PostgreSQLとSQLiteの両アダプターで共有する。
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TransactionRow {
    pub id: i64,
    pub user_id: String,
    pub container_id: String,
    pub borrow_time: DateTime<Utc>,
    pub return_time: Option<DateTime<Utc>>,
    pub status: String,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = TransactionStoreError;

    fn try_from(row: TransactionRow) -> Result<Self> {
        let status =
            TransactionStatus::from_str(&row.status).map_err(TransactionStoreError::InvalidData)?;

        let id = TransactionId::new(row.id);
        let core = TransactionCore {
            user_id: UserId::new(row.user_id),
            container_id: ContainerId::new(row.container_id),
            borrow_time: row.borrow_time,
        };

        match status {
            TransactionStatus::Borrowed => Ok(Transaction::Borrowed(BorrowedTransaction { id, core })),
            TransactionStatus::Returned => {
                let return_time = row.return_time.ok_or_else(|| {
                    TransactionStoreError::InvalidData(format!(
                        "transaction {} is RETURNED but has no return_time",
                        id
                    ))
                })?;
                Ok(Transaction::Returned(ReturnedTransaction {
                    id,
                    core,
                    return_time,
                }))
            }
        }
    }
}

/// 行を貸出中の記録に変換する
///
/// 貸出中の記録を期待するクエリ（status = 'BORROWED'）の結果に使う。
pub(crate) fn into_borrowed(row: TransactionRow) -> Result<BorrowedTransaction> {
    match Transaction::try_from(row)? {
        Transaction::Borrowed(borrowed) => Ok(borrowed),
        Transaction::Returned(returned) => Err(TransactionStoreError::InvalidData(format!(
            "expected transaction {} to be BORROWED",
            returned.id
        ))),
    }
}

/// 挿入エラーを変換する
///
/// 部分ユニークインデックス違反は「貸出中の記録が既にある」ことを意味する。
pub(crate) fn map_insert_error(err: sqlx::Error, container_id: &ContainerId) -> TransactionStoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            TransactionStoreError::ActiveBorrowExists {
                container_id: container_id.clone(),
            }
        }
        _ => TransactionStoreError::from(err),
    }
}

impl From<sqlx::Error> for TransactionStoreError {
    fn from(err: sqlx::Error) -> Self {
        TransactionStoreError::Backend(Box::new(err))
    }
}
