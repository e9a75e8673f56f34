pub mod transaction_store;

pub use transaction_store::*;
