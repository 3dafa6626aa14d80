//! Engine error taxonomy.

use thiserror::Error;

/// Failures reported by the engine or the gateway in front of it.
///
/// `Load` is fatal for every session sharing the gateway; the other kinds are
/// document-level and clear up on the next successful pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("engine unavailable: {0}")]
    Load(String),

    #[error("parse error{}: {message}", .line.map(|l| format!(" on line {l}")).unwrap_or_default())]
    Parse { message: String, line: Option<u32> },

    #[error("layout failed: {0}")]
    Layout(String),

    #[error("render failed: {0}")]
    Render(String),
}

impl EngineError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            line: None,
        }
    }

    pub fn parse_at(message: impl Into<String>, line: u32) -> Self {
        Self::Parse {
            message: message.into(),
            line: Some(line),
        }
    }

    /// Whether the error disables the engine for the rest of the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Load(_))
    }
}
