//! Caching GraphQL proxy behind the tarkov wiki.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
