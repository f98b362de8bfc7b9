//! Photo feed service: read-through caching and batched post assembly over Postgres.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
