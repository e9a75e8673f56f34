use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContainerId, ReturnContainerError, TransactionId, TransactionStatus, UserId};

// ============================================================================
// 型安全な状態パターン
// ============================================================================

/// 貸出記録の共通フィールド
///
/// すべての状態（新規・貸出中・返却済み）で共有されるコアデータ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCore {
    pub user_id: UserId,
    pub container_id: ContainerId,
    pub borrow_time: DateTime<Utc>,
}

/// 未永続化の貸出
///
/// IDはストアが採番するため、この段階ではまだ持たない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBorrow {
    #[serde(flatten)]
    pub core: TransactionCore,
}

impl std::ops::Deref for NewBorrow {
    type Target = TransactionCore;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

/// 貸出中状態
///
/// ビジネスルール：
/// - 同一容器につき貸出中の記録は最大1件
/// - return_timeは未設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowedTransaction {
    pub id: TransactionId,
    #[serde(flatten)]
    pub core: TransactionCore,
}

impl std::ops::Deref for BorrowedTransaction {
    type Target = TransactionCore;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

/// 返却済み状態
///
/// ビジネスルール：
/// - return_timeが必須（型で保証）
/// - 以降は変更されない
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnedTransaction {
    pub id: TransactionId,
    #[serde(flatten)]
    pub core: TransactionCore,
    pub return_time: DateTime<Utc>,
}

impl std::ops::Deref for ReturnedTransaction {
    type Target = TransactionCore;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

/// 貸出記録の統合型
///
/// 状態は BORROWED → RETURNED の一方向のみ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Transaction {
    Borrowed(BorrowedTransaction),
    Returned(ReturnedTransaction),
}

impl Transaction {
    pub fn id(&self) -> TransactionId {
        match self {
            Transaction::Borrowed(t) => t.id,
            Transaction::Returned(t) => t.id,
        }
    }

    pub fn core(&self) -> &TransactionCore {
        match self {
            Transaction::Borrowed(t) => &t.core,
            Transaction::Returned(t) => &t.core,
        }
    }

    pub fn status(&self) -> TransactionStatus {
        match self {
            Transaction::Borrowed(_) => TransactionStatus::Borrowed,
            Transaction::Returned(_) => TransactionStatus::Returned,
        }
    }

    pub fn return_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Transaction::Borrowed(_) => None,
            Transaction::Returned(t) => Some(t.return_time),
        }
    }
}

/// 純粋関数：容器を貸し出す
///
/// 貸出中の重複チェックはストアへの問い合わせが必要なため
/// アプリケーション層の責務。ここでは新しい記録を組み立てるだけ。
pub fn borrow_container(
    user_id: UserId,
    container_id: ContainerId,
    borrowed_at: DateTime<Utc>,
) -> NewBorrow {
    NewBorrow {
        core: TransactionCore {
            user_id,
            container_id,
            borrow_time: borrowed_at,
        },
    }
}

/// 純粋関数：容器を返却する
///
/// ビジネスルール：
/// - 貸出中の記録のみ返却できる
/// - 返却済みの記録は変更不可
///
/// 副作用なし。ReturnedTransactionを返す。
pub fn return_container(
    transaction: Transaction,
    returned_at: DateTime<Utc>,
) -> Result<ReturnedTransaction, ReturnContainerError> {
    match transaction {
        Transaction::Borrowed(borrowed) => Ok(ReturnedTransaction {
            id: borrowed.id,
            core: borrowed.core,
            return_time: returned_at,
        }),
        Transaction::Returned(_) => Err(ReturnContainerError::AlreadyReturned),
    }
}
