use crate::domain::ContainerId;
use crate::ports::TransactionStoreError;
use thiserror::Error;

/// 貸出管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum LendingApplicationError {
    /// 容器が貸出中
    #[error("Container {container_id} is already borrowed")]
    AlreadyBorrowed { container_id: ContainerId },

    /// 記録の状態が不正（例: 貸出中を期待したが返却済みだった）
    #[error("Invalid transaction state: {0}")]
    InvalidTransactionState(String),

    /// TransactionStoreのエラー
    #[error("Transaction store error")]
    StoreError(#[source] TransactionStoreError),
}

impl From<TransactionStoreError> for LendingApplicationError {
    fn from(err: TransactionStoreError) -> Self {
        match err {
            // 同時貸出でインデックス違反になった場合も「貸出中」として扱う
            TransactionStoreError::ActiveBorrowExists { container_id } => {
                LendingApplicationError::AlreadyBorrowed { container_id }
            }
            other => LendingApplicationError::StoreError(other),
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LendingApplicationError>;
