//! Domain layer types and invariants.

pub mod cache_entry;
pub mod error;
pub mod items;
pub mod keys;
pub mod tasks;
pub mod traders;
pub mod types;
