//! Path utilities.
//!
//! - [`fs`]: filesystem path normalization and `~` expansion

pub mod fs;

pub use fs::{expand_user_path, normalize_path, resolve_path};
