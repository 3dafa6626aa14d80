//! `glimpse export`: parse, lay out and export a document once.

use std::path::Path;

use anyhow::{Context, Result, bail};

use super::{ExportArgs, engine_gateway, export_orchestrator};
use crate::config::cfg;
use crate::export::{ArtifactSource, ExportError, ExportFormat, ExportRequest, ExportedArtifact};
use crate::log;
use crate::utils::path::normalize_path;

pub async fn run_export(args: &ExportArgs) -> Result<()> {
    let config = cfg();
    let format = ExportFormat::parse(&args.format)?;
    let source = normalize_path(&args.file);
    let text = read_source(&source).await?;

    let gateway = engine_gateway(&config);
    let document = gateway.parse(&text)?;
    let layout = gateway.compute_layout(&document)?;

    let orchestrator = export_orchestrator(&config, gateway);
    let request = ExportRequest {
        source,
        document,
        layout,
        format,
        theme: config.preview.theme,
        destination: args.output.clone(),
    };

    report(orchestrator.export(request).await)
}

/// Read a document for parsing.
pub(crate) async fn read_source(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

/// Log the outcome of an export. Partial results are listed before failing.
pub(crate) fn report(result: Result<Vec<ExportedArtifact>, ExportError>) -> Result<()> {
    match result {
        Ok(artifacts) => {
            for artifact in &artifacts {
                log!("export"; "{}", describe(artifact));
            }
            Ok(())
        }
        Err(ExportError::Partial { written, failed }) => {
            for path in &written {
                log!("export"; "wrote {}", path.display());
            }
            for failure in &failed {
                log!("error"; "{}", failure.error);
            }
            bail!("exported {} of {} views", written.len(), written.len() + failed.len())
        }
        Err(e) => Err(e.into()),
    }
}

fn describe(artifact: &ExportedArtifact) -> String {
    match &artifact.source {
        ArtifactSource::View(view) => format!("wrote {} ({view})", artifact.path.display()),
        ArtifactSource::AllViews => format!("wrote {} (all views)", artifact.path.display()),
    }
}
