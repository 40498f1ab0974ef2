// Execution ledger and single-instance lock

pub mod ledger;
pub mod lock;

pub use ledger::{date_key, ExecutionLedger};
pub use lock::InstanceLock;
