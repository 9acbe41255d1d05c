pub mod category;
pub mod job;
pub mod serde_helpers;
