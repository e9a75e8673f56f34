pub mod transaction_store;

// パブリックに型を再エクスポート
pub use transaction_store::TransactionStore as PostgresTransactionStore;
