//! Infrastructure layer - adapters to the environment the pools run in

pub mod ledger;
