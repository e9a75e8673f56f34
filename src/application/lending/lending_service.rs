use crate::domain::{self, commands::*};
use crate::domain::{BorrowedTransaction, ContainerId, ReturnedTransaction, Transaction};
use crate::ports::TransactionStore;
use std::sync::Arc;

use super::errors::{LendingApplicationError, Result};

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞いは持たず、各サービス関数に明示的に渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub transaction_store: Arc<dyn TransactionStore>,
}

/// 返却操作の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnOutcome {
    /// 貸出中の記録を返却済みにした
    Returned(ReturnedTransaction),
    /// 貸出中の記録が無かった（エラーではない）
    NotBorrowed,
}

/// 容器を貸し出す
///
/// ビジネスルール：
/// - 同一容器につき貸出中の記録は最大1件
///
/// 事前チェックの後に挿入するが、その間に別の貸出が割り込んだ場合は
/// ストアの部分ユニークインデックスが挿入を拒否し、同じく
/// `AlreadyBorrowed` になる。
///
/// # 戻り値
/// 成功時は作成された貸出中の記録
pub async fn borrow_container(
    deps: &ServiceDependencies,
    cmd: BorrowContainer,
) -> Result<BorrowedTransaction> {
    // 1. 貸出中の記録の確認
    let active = deps
        .transaction_store
        .find_active(&cmd.container_id)
        .await?;

    if active.is_some() {
        tracing::debug!(container_id = %cmd.container_id, "Container is already borrowed");
        return Err(LendingApplicationError::AlreadyBorrowed {
            container_id: cmd.container_id,
        });
    }

    // 2. ドメイン層の純粋関数で新しい記録を組み立てる
    let new_borrow =
        domain::transaction::borrow_container(cmd.user_id, cmd.container_id, cmd.borrowed_at);

    // 3. 保存（採番はストア側）
    let borrowed = deps.transaction_store.insert_borrowed(new_borrow).await?;

    tracing::info!(
        transaction_id = %borrowed.id,
        user_id = %borrowed.user_id,
        container_id = %borrowed.container_id,
        "Container borrowed"
    );

    Ok(borrowed)
}

/// 容器を返却する（APIでは "reset"）
///
/// 貸出中の記録が無い場合は `ReturnOutcome::NotBorrowed` を返し、
/// 状態は変更しない。
pub async fn return_container(
    deps: &ServiceDependencies,
    cmd: ReturnContainer,
) -> Result<ReturnOutcome> {
    // 1. 貸出中の記録を取得
    let Some(active) = deps
        .transaction_store
        .find_active(&cmd.container_id)
        .await?
    else {
        return Ok(ReturnOutcome::NotBorrowed);
    };

    // 2. ドメイン層の純粋関数を呼び出し
    let returned =
        domain::transaction::return_container(Transaction::Borrowed(active), cmd.returned_at)
            .map_err(|e| LendingApplicationError::InvalidTransactionState(format!("{:?}", e)))?;

    // 3. 保存（BORROWEDの場合のみ更新される）
    let updated = deps.transaction_store.mark_returned(&returned).await?;
    if !updated {
        // 取得から更新までの間に別の返却が先に完了した
        tracing::debug!(container_id = %cmd.container_id, "Transaction was returned concurrently");
        return Ok(ReturnOutcome::NotBorrowed);
    }

    tracing::info!(
        transaction_id = %returned.id,
        container_id = %returned.container_id,
        "Container returned"
    );

    Ok(ReturnOutcome::Returned(returned))
}

/// 容器の貸出中の記録を取得する
pub async fn container_status(
    deps: &ServiceDependencies,
    container_id: &ContainerId,
) -> Result<Option<BorrowedTransaction>> {
    Ok(deps.transaction_store.find_active(container_id).await?)
}

/// 容器の貸出履歴を新しい順に取得する
pub async fn container_history(
    deps: &ServiceDependencies,
    container_id: &ContainerId,
) -> Result<Vec<Transaction>> {
    Ok(deps.transaction_store.find_by_container(container_id).await?)
}
