//! Type definitions

pub mod customer;
pub mod import;
pub mod messages;
pub mod payment;
pub mod transaction;

pub use customer::*;
pub use import::*;
pub use messages::*;
pub use payment::*;
pub use transaction::*;
