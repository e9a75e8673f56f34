pub mod database;
pub mod postgres;
pub(crate) mod row;
pub mod sqlite;

pub use database::{DatabaseSetupError, connect_transaction_store};
