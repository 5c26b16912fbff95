//! Import pipeline services

pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod sheet;
pub mod store;
pub mod validate;
