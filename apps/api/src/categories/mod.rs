//! Category and sub-category administration. Job records refer to these by
//! free-form name only; nothing here is consulted when a job is saved.

pub mod handlers;
pub mod query;
pub mod store;
