mod errors;
mod lending_service;

pub use errors::{LendingApplicationError, Result};
pub use lending_service::{
    ReturnOutcome, ServiceDependencies, borrow_container, container_history, container_status,
    return_container,
};
