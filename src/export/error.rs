//! Export error taxonomy.

use std::fmt::Write as _;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::engine::EngineError;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: the document declares no views")]
    NoViews,

    #[error("unsupported export format `{0}` (expected vector, raster or paginated-document)")]
    UnsupportedFormat(String),

    #[error("view `{view}`: {source}")]
    Render {
        view: String,
        #[source]
        source: EngineError,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Some views of a fan-out were written, others failed. Written files
    /// are kept.
    #[error("{}", partial_summary(written, failed))]
    Partial {
        written: Vec<PathBuf>,
        failed: Vec<ViewFailure>,
    },
}

/// One view that could not be exported during a fan-out.
#[derive(Debug)]
pub struct ViewFailure {
    pub view: String,
    pub error: ExportError,
}

impl ExportError {
    pub(crate) fn render(view: &str, source: EngineError) -> Self {
        Self::Render {
            view: view.to_string(),
            source,
        }
    }
}

fn partial_summary(written: &[PathBuf], failed: &[ViewFailure]) -> String {
    let total = written.len() + failed.len();
    let mut out = format!("exported {} of {} views", written.len(), total);
    for path in written {
        let _ = write!(out, "\n  wrote  {}", path.display());
    }
    for failure in failed {
        let _ = write!(out, "\n  failed {}: {}", failure.view, failure.error);
    }
    out
}
