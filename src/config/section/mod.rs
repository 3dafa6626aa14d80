//! Configuration section definitions.
//!
//! Each module corresponds to a section in `glimpse.toml`:
//!
//! | Module    | TOML Section | Purpose                              |
//! |-----------|--------------|--------------------------------------|
//! | `engine`  | `[engine]`   | Engine executable and arguments      |
//! | `preview` | `[preview]`  | Debounce, initial theme/zoom, canvas |
//! | `export`  | `[export]`   | Raster scale, persisted state file   |

mod engine;
mod export;
mod preview;

pub use engine::EngineConfig;
pub use export::ExportConfig;
pub use preview::PreviewConfig;
