pub mod completion;
pub mod handlers;
pub mod mutation;
pub mod payload;
pub mod section;
pub mod service;
pub mod store;
pub mod validation;
