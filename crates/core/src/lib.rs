//! Glossa core: content versioning and automated quality grading.
//!
//! Content items accumulate a lineage of immutable versions. The
//! [`versioning::VersioningEngine`] creates, branches, merges, reverts, and
//! publishes versions; the [`grading::GradingEngine`] scores a version with a
//! deterministic multi-criteria heuristic.
//!
//! Storage is reached only through the [`store::VersionStore`] contract.
//! `glossa-db` provides the PostgreSQL implementation; this crate ships an
//! in-memory one.

pub mod content_version;
pub mod diff;
pub mod error;
pub mod grading;
pub mod lexical;
pub mod merge;
pub mod store;
pub mod types;
pub mod version_arithmetic;
pub mod versioning;

pub use content_version::{
    ChangeType, ContentVersion, ValidationStatus, VersionMetadata, VersionNumber, VersionStatus,
};
pub use diff::{DiffStatus, FieldDiff};
pub use error::CoreError;
pub use grading::{GradingConfig, GradingEngine, GradingResult};
pub use store::{InMemoryVersionStore, VersionStore, VersionTransaction};
pub use versioning::VersioningEngine;
