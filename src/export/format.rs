use std::fmt;
use std::str::FromStr;

use super::ExportError;

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Self-contained SVG, one file per view
    Vector,
    /// PNG, one file per view
    Raster,
    /// PDF, one page per view in a single file
    PaginatedDocument,
}

impl ExportFormat {
    pub const ALL: [Self; 3] = [Self::Vector, Self::Raster, Self::PaginatedDocument];

    /// Parse a format identifier (`vector`/`svg`, `raster`/`png`,
    /// `paginated-document`/`pdf`), case-insensitively.
    pub fn parse(name: &str) -> Result<Self, ExportError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "vector" | "svg" => Ok(Self::Vector),
            "raster" | "png" => Ok(Self::Raster),
            "paginated-document" | "pdf" => Ok(Self::PaginatedDocument),
            _ => Err(ExportError::UnsupportedFormat(name.trim().to_string())),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Raster => "raster",
            Self::PaginatedDocument => "paginated-document",
        }
    }

    /// Canonical file extension, without the dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Vector => "svg",
            Self::Raster => "png",
            Self::PaginatedDocument => "pdf",
        }
    }

    /// Whether a multi-view document becomes one file per view.
    pub const fn fans_out(self) -> bool {
        !matches!(self, Self::PaginatedDocument)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
