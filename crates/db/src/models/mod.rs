//! Database row structs.
//!
//! Each submodule contains a `FromRow` struct matching the table row and
//! conversions to and from the `glossa_core` domain type.

pub mod content_version;
