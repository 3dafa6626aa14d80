//! Export of parsed documents to files.
//!
//! ```text
//! ExportRequest ──► fan-out policy ──► render per view ──► encode ──► write
//!                        │                                            │
//!                        └── DestinationResolver ◄── remember dir ────┘
//! ```
//!
//! `vector` and `raster` write one file per view (a single-view document
//! writes exactly to the destination); `paginated-document` always writes
//! one PDF with a page per view.
//!
//! # Module Structure
//!
//! - `format` - format identifiers and fan-out policy
//! - `destination` - default names, remembered directory, per-view paths
//! - `raster` - resvg rasterization and PNG encoding
//! - `pdf` - page assembly with lopdf
//! - `store` - persisted key/value state

mod destination;
mod error;
mod format;
mod pdf;
mod raster;
mod store;


use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ExportConfig;
use crate::engine::{EngineError, EngineGateway, Layout, ParsedDocument, RenderOptions, Theme, View};

pub use destination::{DestinationResolver, default_file_name, sanitize_suffix};
pub use error::{ExportError, ViewFailure};
pub use format::ExportFormat;
pub use raster::{encode_png, rasterize};
pub use store::{JsonStateStore, LAST_DIRECTORY_KEY, MemoryStateStore, StateStore};

/// Default raster scale factor (device pixels per view pixel).
pub const DEFAULT_RASTER_SCALE: f32 = 2.0;

/// One export action. Constructed per request and discarded afterwards.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Source document path, for default naming and relative destinations
    pub source: PathBuf,
    pub document: ParsedDocument,
    pub layout: Layout,
    pub format: ExportFormat,
    pub theme: Theme,
    /// File or directory; `None` uses the resolver's default
    pub destination: Option<PathBuf>,
}

/// Contents of a written file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Bytes(Vec<u8>),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }
}

/// Which part of the document an artifact holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    View(String),
    AllViews,
}

/// One written file.
#[derive(Debug, Clone)]
pub struct ExportedArtifact {
    pub path: PathBuf,
    pub payload: Payload,
    pub source: ArtifactSource,
}

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    pub raster_scale: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            raster_scale: DEFAULT_RASTER_SCALE,
        }
    }
}

impl From<&ExportConfig> for ExportOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            raster_scale: config.raster_scale,
        }
    }
}

pub struct ExportOrchestrator {
    gateway: Arc<EngineGateway>,
    resolver: Arc<DestinationResolver>,
    options: ExportOptions,
}

impl ExportOrchestrator {
    pub fn new(
        gateway: Arc<EngineGateway>,
        resolver: Arc<DestinationResolver>,
        options: ExportOptions,
    ) -> Self {
        Self {
            gateway,
            resolver,
            options,
        }
    }

    pub fn resolver(&self) -> &DestinationResolver {
        &self.resolver
    }

    /// Export `request`, returning the written artifacts in view order.
    ///
    /// On full success the destination directory is remembered. A fan-out
    /// where some views fail keeps the files already written and reports
    /// [`ExportError::Partial`].
    pub async fn export(&self, request: ExportRequest) -> Result<Vec<ExportedArtifact>, ExportError> {
        let views = request.document.views();
        if views.is_empty() {
            return Err(ExportError::NoViews);
        }

        let target = self.resolver.resolve(
            &request.source,
            request.format,
            request.destination.as_deref(),
        );
        crate::debug!("export"; "{} {} view(s) to {}", request.format, views.len(), target.display());

        let artifacts = if request.format.fans_out() {
            self.export_each(&request, &target).await?
        } else {
            vec![self.export_paginated(&request, target).await?]
        };

        if let Some(first) = artifacts.first() {
            self.resolver.remember(&first.path);
        }
        Ok(artifacts)
    }

    /// One file per view, or exactly `target` for a single view.
    async fn export_each(
        &self,
        request: &ExportRequest,
        target: &Path,
    ) -> Result<Vec<ExportedArtifact>, ExportError> {
        let views = request.document.views();
        if let [view] = views {
            let artifact = self.export_view(request, view, target.to_path_buf()).await?;
            return Ok(vec![artifact]);
        }

        let paths = destination::fan_out_paths(target, views, request.format);
        let mut written = Vec::with_capacity(views.len());
        let mut failed = Vec::new();

        for (view, path) in views.iter().zip(paths) {
            match self.export_view(request, view, path).await {
                Ok(artifact) => written.push(artifact),
                Err(error) => {
                    crate::debug!("export"; "view `{}` failed: {}", view.name, error);
                    failed.push(ViewFailure {
                        view: view.name.clone(),
                        error,
                    });
                }
            }
        }

        if failed.is_empty() {
            Ok(written)
        } else {
            Err(ExportError::Partial {
                written: written.into_iter().map(|a| a.path).collect(),
                failed,
            })
        }
    }

    async fn export_view(
        &self,
        request: &ExportRequest,
        view: &View,
        path: PathBuf,
    ) -> Result<ExportedArtifact, ExportError> {
        let (theme, scale) = (request.theme, self.options.raster_scale);
        let payload = match request.format {
            ExportFormat::Raster => {
                self.render_blocking(request, view, move |svg| {
                    raster::encode_png(&svg, theme, scale).map(Payload::Bytes)
                })
                .await?
            }
            _ => {
                self.render_blocking(request, view, |svg| Ok(Payload::Text(svg)))
                    .await?
            }
        };

        write(&path, payload.as_bytes()).await?;
        Ok(ExportedArtifact {
            path,
            payload,
            source: ArtifactSource::View(view.name.clone()),
        })
    }

    /// All views as pages of one PDF. Nothing is written unless every view
    /// renders.
    async fn export_paginated(
        &self,
        request: &ExportRequest,
        path: PathBuf,
    ) -> Result<ExportedArtifact, ExportError> {
        let (theme, scale) = (request.theme, self.options.raster_scale);
        let mut pages = Vec::with_capacity(request.document.views().len());
        for view in request.document.views() {
            let image = self
                .render_blocking(request, view, move |svg| {
                    raster::rasterize(&svg, theme, scale)
                })
                .await?;
            pages.push(pdf::Page {
                image,
                width: view.width,
                height: view.height,
            });
        }

        let assembly_failed = |reason: String| ExportError::Render {
            view: "all views".into(),
            source: EngineError::Render(format!("pdf assembly failed: {reason}")),
        };
        let bytes = match tokio::task::spawn_blocking(move || pdf::assemble(pages)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => return Err(assembly_failed(e.to_string())),
            Err(e) => return Err(assembly_failed(e.to_string())),
        };

        write(&path, &bytes).await?;
        Ok(ExportedArtifact {
            path,
            payload: Payload::Bytes(bytes),
            source: ArtifactSource::AllViews,
        })
    }

    /// Render one view and encode its SVG on the blocking pool. The engine
    /// call and rasterization both block.
    async fn render_blocking<T, F>(
        &self,
        request: &ExportRequest,
        view: &View,
        encode: F,
    ) -> Result<T, ExportError>
    where
        T: Send + 'static,
        F: FnOnce(String) -> Result<T, EngineError> + Send + 'static,
    {
        let gateway = Arc::clone(&self.gateway);
        let document = request.document.clone();
        let layout = request.layout.clone();
        let options = RenderOptions::for_view(view, request.theme);

        let task = tokio::task::spawn_blocking(move || {
            let visual = gateway.render_view(&document, &layout, &options)?;
            encode(visual.svg)
        });

        match task.await {
            Ok(result) => result.map_err(|e| ExportError::render(&view.name, e)),
            Err(e) => Err(ExportError::render(
                &view.name,
                EngineError::Render(format!("render task failed: {e}")),
            )),
        }
    }
}

async fn write(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })
}
