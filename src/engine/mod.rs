pub mod fleet;
pub mod ledger;
