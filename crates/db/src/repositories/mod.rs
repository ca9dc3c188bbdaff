//! Repository structs providing query operations per table.
//!
//! Each repository is a zero-sized struct with async methods that accept a
//! Postgres executor and return `Result<T, sqlx::Error>`.

pub mod content_version_repo;

pub use content_version_repo::ContentVersionRepo;
