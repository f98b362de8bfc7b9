//! Application services: read-through lookups, batch assembly, cached read paths and writes.

pub mod assembler;
pub mod content;
pub mod error;
pub mod invalidation;
pub mod repos;
pub mod timeline;
pub mod users;
