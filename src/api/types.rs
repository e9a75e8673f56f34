use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    BorrowedTransaction, ContainerId, Transaction, UserId,
    commands::{BorrowContainer, ReturnContainer},
};

/// 貸出リクエスト（POST /api/borrow）
///
/// LIFFフロントエンドが送るJSONのフィールド名に合わせる。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    pub line_user_id: String,
    pub container_id: String,
}

impl BorrowRequest {
    pub fn to_command(&self, borrowed_at: DateTime<Utc>) -> BorrowContainer {
        BorrowContainer {
            user_id: UserId::new(self.line_user_id.clone()),
            container_id: ContainerId::new(self.container_id.clone()),
            borrowed_at,
        }
    }
}

/// 返却リクエスト（POST /api/reset）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest {
    pub container_id: String,
}

impl ResetRequest {
    pub fn to_command(&self, returned_at: DateTime<Utc>) -> ReturnContainer {
        ReturnContainer {
            container_id: ContainerId::new(self.container_id.clone()),
            returned_at,
        }
    }
}

/// 操作結果の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    /// 状態変更なし（例: 貸出中でない容器の返却）
    Info,
}

/// 貸出レスポンス
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowResponse {
    pub status: ResultStatus,
    pub message: String,
    pub time: DateTime<Utc>,
    pub transaction_id: i64,
}

impl From<&BorrowedTransaction> for BorrowResponse {
    fn from(borrowed: &BorrowedTransaction) -> Self {
        Self {
            status: ResultStatus::Success,
            message: format!("{} borrowed successfully", borrowed.container_id),
            time: borrowed.borrow_time,
            transaction_id: borrowed.id.value(),
        }
    }
}

/// 返却レスポンス
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub status: ResultStatus,
    pub message: String,
}

impl ResetResponse {
    pub fn returned(container_id: &ContainerId) -> Self {
        Self {
            status: ResultStatus::Success,
            message: format!(
                "Container {} returned, you can borrow it now!",
                container_id
            ),
        }
    }

    pub fn not_borrowed() -> Self {
        Self {
            status: ResultStatus::Info,
            message: "This container is not borrowed".to_string(),
        }
    }
}

/// 貸出記録レスポンス（GET /api/containers/:container_id/transactions）
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: i64,
    pub user_id: String,
    pub container_id: String,
    pub borrow_time: DateTime<Utc>,
    pub return_time: Option<DateTime<Utc>>,
    pub status: String,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        let status = transaction.status().as_str().to_string();
        let return_time = transaction.return_time();
        let id = transaction.id().value();
        let core = match transaction {
            Transaction::Borrowed(t) => t.core,
            Transaction::Returned(t) => t.core,
        };

        Self {
            id,
            user_id: core.user_id.into_inner(),
            container_id: core.container_id.into_inner(),
            borrow_time: core.borrow_time,
            return_time,
            status,
        }
    }
}

/// 容器状態レスポンス（GET /api/containers/:container_id）
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStatusResponse {
    pub container_id: String,
    pub borrowed: bool,
    pub active_transaction: Option<TransactionResponse>,
}

impl ContainerStatusResponse {
    pub fn new(container_id: &ContainerId, active: Option<BorrowedTransaction>) -> Self {
        Self {
            container_id: container_id.to_string(),
            borrowed: active.is_some(),
            active_transaction: active
                .map(|borrowed| TransactionResponse::from(Transaction::Borrowed(borrowed))),
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
