use crate::domain::{
    BorrowedTransaction, ContainerId, NewBorrow, ReturnedTransaction, Transaction, TransactionId,
};
use async_trait::async_trait;
use thiserror::Error;

/// 取引ストアのエラー
#[derive(Debug, Error)]
pub enum TransactionStoreError {
    /// 貸出中の記録が既に存在する（部分ユニークインデックス違反）
    #[error("Container {container_id} already has an active borrow")]
    ActiveBorrowExists { container_id: ContainerId },

    /// 保存済みの行をドメイン型に変換できない
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// データベース接続・クエリ失敗
    #[error("Transaction store backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, TransactionStoreError>;

/// 取引ストアポート
///
/// 貸出記録テーブル（1貸出1行）の永続化を抽象化する。
/// 記録は削除されず、更新は BORROWED → RETURNED の1回のみ。
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// 容器の貸出中の記録を取得する
    async fn find_active(&self, container_id: &ContainerId)
    -> Result<Option<BorrowedTransaction>>;

    /// 新しい貸出記録を挿入する
    ///
    /// 同じ容器に貸出中の記録が既にある場合は
    /// `TransactionStoreError::ActiveBorrowExists` を返す。
    /// 事前チェックをすり抜けた同時貸出もここで弾かれる。
    async fn insert_borrowed(&self, new_borrow: NewBorrow) -> Result<BorrowedTransaction>;

    /// 貸出中の記録を返却済みに更新する
    ///
    /// 記録がまだ BORROWED の場合のみ更新する。
    /// 既に返却済み（同時返却など）で更新しなかった場合は `false` を返す。
    async fn mark_returned(&self, returned: &ReturnedTransaction) -> Result<bool>;

    /// IDで記録を取得する
    async fn get_by_id(&self, id: TransactionId) -> Result<Option<Transaction>>;

    /// 容器の全記録を新しい順に取得する
    async fn find_by_container(&self, container_id: &ContainerId) -> Result<Vec<Transaction>>;
}
