//! Database queries

pub mod customer;
pub mod payment;
pub mod transaction;
