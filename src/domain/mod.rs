pub mod commands;
pub mod errors;
pub mod transaction;
pub mod value_objects;

pub use errors::*;
pub use transaction::*;
pub use value_objects::*;
