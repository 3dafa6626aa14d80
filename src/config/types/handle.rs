//! Global config with atomic replacement.
//!
//! Uses `arc-swap` for lock-free reads. Commands that need the loaded
//! configuration after startup go through [`cfg`].

use crate::config::GlimpseConfig;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<GlimpseConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(GlimpseConfig::default()));

#[inline]
pub fn cfg() -> Arc<GlimpseConfig> {
    CONFIG.load_full()
}

#[inline]
pub fn init_config(config: GlimpseConfig) -> Arc<GlimpseConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
