use async_trait::async_trait;
use chrono::{Duration, Utc};
use container_lending::application::lending::{
    LendingApplicationError, ReturnOutcome, ServiceDependencies, borrow_container,
    container_history, container_status, return_container,
};
use container_lending::domain::commands::*;
use container_lending::domain::*;
use container_lending::ports::transaction_store::{
    Result as StoreResult, TransactionStore, TransactionStoreError,
};
use std::sync::{Arc, Mutex};

// ============================================================================
// インメモリモック実装（テスト用）
// ============================================================================

/// インメモリTransactionStore実装
///
/// 貸出中記録の一意性はDBの部分ユニークインデックスと同じく挿入時に検査する。
struct InMemoryTransactionStore {
    transactions: Mutex<Vec<Transaction>>,
}

impl InMemoryTransactionStore {
    fn new() -> Self {
        Self {
            transactions: Mutex::new(Vec::new()),
        }
    }

    fn active_count(&self, container_id: &str) -> usize {
        self.transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.status().is_borrowed() && t.core().container_id.as_str() == container_id)
            .count()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn find_active(
        &self,
        container_id: &ContainerId,
    ) -> StoreResult<Option<BorrowedTransaction>> {
        let transactions = self.transactions.lock().unwrap();
        Ok(transactions.iter().find_map(|t| match t {
            Transaction::Borrowed(b) if &b.container_id == container_id => Some(b.clone()),
            _ => None,
        }))
    }

    async fn insert_borrowed(&self, new_borrow: NewBorrow) -> StoreResult<BorrowedTransaction> {
        let mut transactions = self.transactions.lock().unwrap();

        let conflict = transactions.iter().any(|t| {
            t.status().is_borrowed() && t.core().container_id == new_borrow.container_id
        });
        if conflict {
            return Err(TransactionStoreError::ActiveBorrowExists {
                container_id: new_borrow.container_id.clone(),
            });
        }

        let borrowed = BorrowedTransaction {
            id: TransactionId::new(transactions.len() as i64 + 1),
            core: new_borrow.core,
        };
        transactions.push(Transaction::Borrowed(borrowed.clone()));
        Ok(borrowed)
    }

    async fn mark_returned(&self, returned: &ReturnedTransaction) -> StoreResult<bool> {
        let mut transactions = self.transactions.lock().unwrap();
        for t in transactions.iter_mut() {
            if t.id() == returned.id && t.status().is_borrowed() {
                *t = Transaction::Returned(returned.clone());
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn get_by_id(&self, id: TransactionId) -> StoreResult<Option<Transaction>> {
        let transactions = self.transactions.lock().unwrap();
        Ok(transactions.iter().find(|t| t.id() == id).cloned())
    }

    async fn find_by_container(&self, container_id: &ContainerId) -> StoreResult<Vec<Transaction>> {
        let transactions = self.transactions.lock().unwrap();
        Ok(transactions
            .iter()
            .rev()
            .filter(|t| &t.core().container_id == container_id)
            .cloned()
            .collect())
    }
}

/// 事前チェックをすり抜ける同時貸出を再現するストア
///
/// find_activeが常にNoneを返すため、重複は挿入時にのみ検出される。
struct RacingTransactionStore {
    inner: InMemoryTransactionStore,
}

#[async_trait]
impl TransactionStore for RacingTransactionStore {
    async fn find_active(&self, _: &ContainerId) -> StoreResult<Option<BorrowedTransaction>> {
        Ok(None)
    }

    async fn insert_borrowed(&self, new_borrow: NewBorrow) -> StoreResult<BorrowedTransaction> {
        self.inner.insert_borrowed(new_borrow).await
    }

    async fn mark_returned(&self, returned: &ReturnedTransaction) -> StoreResult<bool> {
        self.inner.mark_returned(returned).await
    }

    async fn get_by_id(&self, id: TransactionId) -> StoreResult<Option<Transaction>> {
        self.inner.get_by_id(id).await
    }

    async fn find_by_container(&self, container_id: &ContainerId) -> StoreResult<Vec<Transaction>> {
        self.inner.find_by_container(container_id).await
    }
}

/// 取得と更新の間に別の返却が完了した状況を再現するストア
struct ConcurrentlyReturnedStore {
    inner: InMemoryTransactionStore,
}

#[async_trait]
impl TransactionStore for ConcurrentlyReturnedStore {
    async fn find_active(
        &self,
        container_id: &ContainerId,
    ) -> StoreResult<Option<BorrowedTransaction>> {
        self.inner.find_active(container_id).await
    }

    async fn insert_borrowed(&self, new_borrow: NewBorrow) -> StoreResult<BorrowedTransaction> {
        self.inner.insert_borrowed(new_borrow).await
    }

    async fn mark_returned(&self, _: &ReturnedTransaction) -> StoreResult<bool> {
        Ok(false)
    }

    async fn get_by_id(&self, id: TransactionId) -> StoreResult<Option<Transaction>> {
        self.inner.get_by_id(id).await
    }

    async fn find_by_container(&self, container_id: &ContainerId) -> StoreResult<Vec<Transaction>> {
        self.inner.find_by_container(container_id).await
    }
}

/// 常に失敗するストア（DB障害）
struct UnavailableTransactionStore;

fn unavailable() -> TransactionStoreError {
    TransactionStoreError::Backend(Box::new(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "database is down",
    )))
}

#[async_trait]
impl TransactionStore for UnavailableTransactionStore {
    async fn find_active(&self, _: &ContainerId) -> StoreResult<Option<BorrowedTransaction>> {
        Err(unavailable())
    }

    async fn insert_borrowed(&self, _: NewBorrow) -> StoreResult<BorrowedTransaction> {
        Err(unavailable())
    }

    async fn mark_returned(&self, _: &ReturnedTransaction) -> StoreResult<bool> {
        Err(unavailable())
    }

    async fn get_by_id(&self, _: TransactionId) -> StoreResult<Option<Transaction>> {
        Err(unavailable())
    }

    async fn find_by_container(&self, _: &ContainerId) -> StoreResult<Vec<Transaction>> {
        Err(unavailable())
    }
}

// ============================================================================
// テストヘルパー
// ============================================================================

fn setup() -> (ServiceDependencies, Arc<InMemoryTransactionStore>) {
    let store = Arc::new(InMemoryTransactionStore::new());
    let deps = ServiceDependencies {
        transaction_store: store.clone(),
    };
    (deps, store)
}

fn borrow_cmd(user: &str, container: &str) -> BorrowContainer {
    BorrowContainer {
        user_id: UserId::new(user),
        container_id: ContainerId::new(container),
        borrowed_at: Utc::now(),
    }
}

fn return_cmd(container: &str) -> ReturnContainer {
    ReturnContainer {
        container_id: ContainerId::new(container),
        returned_at: Utc::now(),
    }
}

// ============================================================================
// borrow_container
// ============================================================================

#[tokio::test]
async fn test_borrow_container_success() {
    let (deps, store) = setup();
    let cmd = borrow_cmd("U1", "BOX7");

    let borrowed = borrow_container(&deps, cmd.clone()).await.unwrap();

    assert_eq!(borrowed.user_id, cmd.user_id);
    assert_eq!(borrowed.container_id, cmd.container_id);
    assert_eq!(borrowed.borrow_time, cmd.borrowed_at);

    // 1行挿入されている
    let stored = store.get_by_id(borrowed.id).await.unwrap().unwrap();
    assert_eq!(stored.status(), TransactionStatus::Borrowed);
    assert_eq!(stored.return_time(), None);
}

#[tokio::test]
async fn test_borrow_container_fails_when_already_borrowed() {
    let (deps, store) = setup();

    borrow_container(&deps, borrow_cmd("U1", "BOX7")).await.unwrap();
    let result = borrow_container(&deps, borrow_cmd("U2", "BOX7")).await;

    match result {
        Err(LendingApplicationError::AlreadyBorrowed { container_id }) => {
            assert_eq!(container_id.as_str(), "BOX7");
        }
        other => panic!("expected AlreadyBorrowed, got {:?}", other),
    }
    assert_eq!(store.active_count("BOX7"), 1);
}

#[tokio::test]
async fn test_borrow_container_same_user_twice_is_rejected() {
    let (deps, _) = setup();

    borrow_container(&deps, borrow_cmd("U1", "BOX7")).await.unwrap();
    let result = borrow_container(&deps, borrow_cmd("U1", "BOX7")).await;

    assert!(matches!(
        result,
        Err(LendingApplicationError::AlreadyBorrowed { .. })
    ));
}

#[tokio::test]
async fn test_borrow_different_containers_independently() {
    let (deps, store) = setup();

    borrow_container(&deps, borrow_cmd("U1", "BOX1")).await.unwrap();
    borrow_container(&deps, borrow_cmd("U1", "BOX2")).await.unwrap();

    assert_eq!(store.active_count("BOX1"), 1);
    assert_eq!(store.active_count("BOX2"), 1);
}

#[tokio::test]
async fn test_borrow_race_detected_by_store_is_already_borrowed() {
    let store = Arc::new(RacingTransactionStore {
        inner: InMemoryTransactionStore::new(),
    });
    let deps = ServiceDependencies {
        transaction_store: store.clone(),
    };

    borrow_container(&deps, borrow_cmd("U1", "BOX7")).await.unwrap();
    // 事前チェックは通過するが挿入で弾かれる
    let result = borrow_container(&deps, borrow_cmd("U2", "BOX7")).await;

    assert!(matches!(
        result,
        Err(LendingApplicationError::AlreadyBorrowed { .. })
    ));
    assert_eq!(store.inner.active_count("BOX7"), 1);
}

#[tokio::test]
async fn test_borrow_after_return_creates_new_record() {
    let (deps, store) = setup();

    let first = borrow_container(&deps, borrow_cmd("U1", "BOX7")).await.unwrap();
    return_container(&deps, return_cmd("BOX7")).await.unwrap();
    let second = borrow_container(&deps, borrow_cmd("U2", "BOX7")).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(second.user_id, UserId::new("U2"));

    // 最初の記録は返却済みのまま
    let first_stored = store.get_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(first_stored.status(), TransactionStatus::Returned);
    assert_eq!(store.active_count("BOX7"), 1);
}

// ============================================================================
// return_container
// ============================================================================

#[tokio::test]
async fn test_return_container_success() {
    let (deps, store) = setup();
    let borrowed = borrow_container(&deps, borrow_cmd("U1", "BOX7")).await.unwrap();
    let cmd = ReturnContainer {
        container_id: ContainerId::new("BOX7"),
        returned_at: borrowed.borrow_time + Duration::hours(2),
    };

    let outcome = return_container(&deps, cmd.clone()).await.unwrap();

    match outcome {
        ReturnOutcome::Returned(returned) => {
            assert_eq!(returned.id, borrowed.id);
            assert_eq!(returned.return_time, cmd.returned_at);
        }
        ReturnOutcome::NotBorrowed => panic!("expected Returned"),
    }

    let stored = store.get_by_id(borrowed.id).await.unwrap().unwrap();
    assert_eq!(stored.status(), TransactionStatus::Returned);
    assert_eq!(stored.return_time(), Some(cmd.returned_at));
    assert_eq!(store.active_count("BOX7"), 0);
}

#[tokio::test]
async fn test_return_container_not_borrowed_is_info() {
    let (deps, store) = setup();

    let outcome = return_container(&deps, return_cmd("BOX7")).await.unwrap();

    assert_eq!(outcome, ReturnOutcome::NotBorrowed);
    // 状態は変化しない
    assert!(
        store
            .find_by_container(&ContainerId::new("BOX7"))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_return_container_twice_is_noop() {
    let (deps, store) = setup();
    let borrowed = borrow_container(&deps, borrow_cmd("U1", "BOX7")).await.unwrap();

    let first = return_container(&deps, return_cmd("BOX7")).await.unwrap();
    let stored_after_first = store.get_by_id(borrowed.id).await.unwrap();
    let second = return_container(&deps, return_cmd("BOX7")).await.unwrap();

    assert!(matches!(first, ReturnOutcome::Returned(_)));
    assert_eq!(second, ReturnOutcome::NotBorrowed);
    // 返却済みの記録は再度変更されない
    assert_eq!(store.get_by_id(borrowed.id).await.unwrap(), stored_after_first);
}

#[tokio::test]
async fn test_return_container_lost_race_is_not_borrowed() {
    let store = Arc::new(ConcurrentlyReturnedStore {
        inner: InMemoryTransactionStore::new(),
    });
    let deps = ServiceDependencies {
        transaction_store: store,
    };
    borrow_container(&deps, borrow_cmd("U1", "BOX7")).await.unwrap();

    let outcome = return_container(&deps, return_cmd("BOX7")).await.unwrap();

    assert_eq!(outcome, ReturnOutcome::NotBorrowed);
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_container_status_reflects_latest_call() {
    let (deps, _) = setup();
    let container_id = ContainerId::new("BOX7");

    assert!(container_status(&deps, &container_id).await.unwrap().is_none());

    let borrowed = borrow_container(&deps, borrow_cmd("U1", "BOX7")).await.unwrap();
    let active = container_status(&deps, &container_id).await.unwrap();
    assert_eq!(active.map(|t| t.id), Some(borrowed.id));

    return_container(&deps, return_cmd("BOX7")).await.unwrap();
    assert!(container_status(&deps, &container_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_container_history_newest_first() {
    let (deps, _) = setup();

    let first = borrow_container(&deps, borrow_cmd("U1", "BOX7")).await.unwrap();
    return_container(&deps, return_cmd("BOX7")).await.unwrap();
    let second = borrow_container(&deps, borrow_cmd("U2", "BOX7")).await.unwrap();
    borrow_container(&deps, borrow_cmd("U3", "OTHER")).await.unwrap();

    let history = container_history(&deps, &ContainerId::new("BOX7"))
        .await
        .unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id(), second.id);
    assert_eq!(history[0].status(), TransactionStatus::Borrowed);
    assert_eq!(history[1].id(), first.id);
    assert_eq!(history[1].status(), TransactionStatus::Returned);
}

// ============================================================================
// Store failures
// ============================================================================

#[tokio::test]
async fn test_store_failure_propagates_as_store_error() {
    let deps = ServiceDependencies {
        transaction_store: Arc::new(UnavailableTransactionStore),
    };

    let borrow = borrow_container(&deps, borrow_cmd("U1", "BOX7")).await;
    assert!(matches!(
        borrow,
        Err(LendingApplicationError::StoreError(
            TransactionStoreError::Backend(_)
        ))
    ));

    let ret = return_container(&deps, return_cmd("BOX7")).await;
    assert!(matches!(ret, Err(LendingApplicationError::StoreError(_))));
}
