//! Application services and the ports they depend on.

pub mod catalog;
pub mod error;
pub mod inflight;
pub mod invalidation;
pub mod query;
pub mod repos;
pub mod upstream;
