//! Engine binding.
//!
//! The engine is the external parser / layout solver / renderer. The core
//! never looks inside its output beyond the ordered view list, so the types
//! here are deliberately thin:
//!
//! ```text
//! text ──parse──► ParsedDocument ──build_layout──► Layout
//!                      │                              │
//!                      └──────────render(view, theme)─┴──► VisualOutput (SVG)
//! ```
//!
//! # Module Structure
//!
//! - `error` - `EngineError` taxonomy
//! - `gateway` - lazily loaded, shared engine handle
//! - `process` - engine executable speaking JSON over stdio
//! - `svg` - explicit width/height injection on rendered markup

mod error;
mod gateway;
mod process;
mod svg;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use error::EngineError;
pub use gateway::{EngineGateway, EngineLoader};
pub use process::ProcessEngine;
pub use svg::ensure_dimensions;

// =============================================================================
// Engine trait
// =============================================================================

/// The external engine contract.
///
/// Implementations are shared across sessions behind an `Arc`, so they must
/// not rely on `&mut self`. Every call is synchronous from the caller's point
/// of view.
pub trait Engine: Send + Sync {
    /// Parse source text into the engine's intermediate representation.
    fn parse(&self, text: &str) -> Result<ParsedDocument, EngineError>;

    /// Solve positions and sizes for a parsed document.
    fn build_layout(&self, document: &ParsedDocument) -> Result<Layout, EngineError>;

    /// Render one view to self-contained SVG markup.
    fn render(
        &self,
        document: &ParsedDocument,
        layout: &Layout,
        options: &RenderOptions,
    ) -> Result<String, EngineError>;
}

// =============================================================================
// Theme
// =============================================================================

/// Preview / export color theme.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Opaque canvas color used when flattening a render (RGB).
    pub const fn background(self) -> [u8; 3] {
        match self {
            Self::Light => [0xff, 0xff, 0xff],
            Self::Dark => [0x1e, 0x1e, 0x1e],
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme `{other}` (expected light or dark)")),
        }
    }
}

// =============================================================================
// Parsed document / layout
// =============================================================================

/// A named logical sub-screen with its intrinsic size (device-independent px).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    pub width: f64,
    pub height: f64,
}

impl View {
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }
}

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Engine intermediate representation.
///
/// Only the view list is readable; `body` is the engine's own payload and is
/// handed back to it untouched. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    id: u64,
    views: Arc<[View]>,
    body: Arc<Value>,
}

impl ParsedDocument {
    pub fn new(views: Vec<View>, body: Value) -> Self {
        Self {
            id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
            views: views.into(),
            body: Arc::new(body),
        }
    }

    /// Process-unique identity of this parse result.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Views in source declaration order.
    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }

    pub fn first_view(&self) -> Option<&View> {
        self.views.first()
    }

    pub fn view_names(&self) -> Vec<String> {
        self.views.iter().map(|v| v.name.clone()).collect()
    }

    pub fn body(&self) -> &Value {
        &self.body
    }
}

/// Engine layout solution, bound to exactly one `ParsedDocument`.
#[derive(Debug, Clone)]
pub struct Layout {
    document: u64,
    body: Arc<Value>,
}

impl Layout {
    pub fn new(document: &ParsedDocument, body: Value) -> Self {
        Self {
            document: document.id(),
            body: Arc::new(body),
        }
    }

    pub fn belongs_to(&self, document: &ParsedDocument) -> bool {
        self.document == document.id()
    }

    pub fn body(&self) -> &Value {
        &self.body
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Parameters for a single render call.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub view: Option<String>,
    pub theme: Theme,
    pub width: f64,
    pub height: f64,
}

impl RenderOptions {
    /// Render `view` at its intrinsic size.
    pub fn for_view(view: &View, theme: Theme) -> Self {
        Self {
            view: Some(view.name.clone()),
            theme,
            width: view.width,
            height: view.height,
        }
    }
}

/// A rendered view: SVG markup that always declares its own width/height.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualOutput {
    pub svg: String,
    pub view: Option<String>,
    pub theme: Theme,
    pub width: f64,
    pub height: f64,
}
