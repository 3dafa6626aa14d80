//! Content hashing using FxHash.
//!
//! Fast and deterministic within a process; used to detect unchanged document
//! text, never persisted.
//!
//! ```ignore
//! use crate::utils::hash;
//!
//! let h = hash::compute("Login 320x480"); // -> u64
//! ```

use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Compute 64-bit hash from byte data.
#[inline]
pub fn compute<T: AsRef<[u8]> + ?Sized>(data: &T) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(data.as_ref());
    hasher.finish()
}
