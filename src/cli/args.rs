//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::engine::Theme;

/// Live preview and export for multi-view UI documents
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Print debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: glimpse.toml)
    #[arg(short = 'C', long, global = true, default_value = "glimpse.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Watch a document and keep its preview up to date
    #[command(visible_alias = "p")]
    Preview {
        #[command(flatten)]
        args: PreviewArgs,
    },

    /// Export a document's views to files
    #[command(visible_alias = "e")]
    Export {
        #[command(flatten)]
        args: ExportArgs,
    },
}

impl Commands {
    /// Theme requested on the command line, overriding `[preview] theme`.
    pub fn theme(&self) -> Option<Theme> {
        match self {
            Self::Preview { args } => args.theme,
            Self::Export { args } => args.theme,
        }
    }
}

/// Preview command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct PreviewArgs {
    /// Document to preview
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Initial theme
    #[arg(short, long, value_enum)]
    pub theme: Option<Theme>,

    /// View to show first (defaults to the first declared view)
    #[arg(long)]
    pub view: Option<String>,

    /// Where the rendered SVG is written (default: <file stem>.preview.svg)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

/// Export command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ExportArgs {
    /// Document to export
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Output format: vector (svg), raster (png) or paginated-document (pdf)
    #[arg(short, long, default_value = "raster")]
    pub format: String,

    /// Destination file or directory
    #[arg(short, long, value_hint = clap::ValueHint::AnyPath)]
    pub output: Option<PathBuf>,

    /// Render theme
    #[arg(short, long, value_enum)]
    pub theme: Option<Theme>,
}
