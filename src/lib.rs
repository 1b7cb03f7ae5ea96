//! Shared-expense ledger for group spending: records expenses and
//! settlements, validates splits, and derives who-owes-whom balances.

pub mod balance;
pub mod error;
pub mod ledger;
pub mod money;
pub mod schemas;
pub mod store;
