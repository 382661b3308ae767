//! ipwarm Storage - Warm-up progress persistence
//!
//! This crate provides the `WarmupStatus` record and the repository
//! that stores one record per IP pool, backed by memory, local JSON
//! files or PostgreSQL.

pub mod db;
pub mod models;
pub mod repository;

pub use db::DatabasePool;
pub use models::*;
pub use repository::*;
