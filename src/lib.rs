//! Glimpse - live preview and export for multi-view UI documents.
//!
//! A document declares one or more named views. An external engine parses
//! it, solves its layout and renders each view to SVG; this crate keeps
//! previews of edited documents current without blocking the editor, and
//! exports views as SVG, PNG or a paginated PDF.
//!
//! | Module    | Purpose                                              |
//! |-----------|------------------------------------------------------|
//! | `engine`  | Engine contract, lazily loaded gateway, process impl |
//! | `preview` | Debounced per-document sessions and their actors     |
//! | `export`  | Format conversion, destinations, remembered state    |
//! | `config`  | `glimpse.toml` loading and validation                |
//! | `cli`     | Command-line preview host and export command         |

pub mod cli;
pub mod config;
pub mod engine;
pub mod export;
pub mod logger;
pub mod preview;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
