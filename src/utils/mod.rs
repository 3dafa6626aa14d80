//! Shared helpers.
//!
//! - [`exec`]: external command builder (engine executable)
//! - [`hash`]: content fingerprints for freshness checks
//! - [`path`]: path normalization and user-path expansion

pub mod exec;
pub mod hash;
pub mod path;
