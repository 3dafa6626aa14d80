//! Engine gateway: the single entry point to the engine.
//!
//! The engine handle is resolved on first use and memoized for the lifetime
//! of the gateway, including a failed resolution: an engine that could not be
//! loaded is not retried. Concurrent first callers block on the same
//! initialization and observe the same result.

use std::fmt;
use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashSet;

use super::{
    Engine, EngineError, Layout, ParsedDocument, RenderOptions, VisualOutput, View,
    ensure_dimensions,
};

/// Resolves the engine handle. Called at most once per gateway.
pub type EngineLoader = Box<dyn Fn() -> Result<Arc<dyn Engine>, EngineError> + Send + Sync>;

pub struct EngineGateway {
    loader: EngineLoader,
    engine: OnceLock<Result<Arc<dyn Engine>, EngineError>>,
}

impl fmt::Debug for EngineGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.engine.get() {
            None => "unresolved",
            Some(Ok(_)) => "loaded",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("EngineGateway").field("engine", &state).finish()
    }
}

impl EngineGateway {
    /// Gateway that resolves its engine lazily through `loader`.
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Engine>, EngineError> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            engine: OnceLock::new(),
        }
    }

    /// Gateway around an already resolved engine.
    pub fn with_engine(engine: Arc<dyn Engine>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Ok(engine));
        Self {
            loader: Box::new(|| Err(EngineError::Load("engine already resolved".into()))),
            engine: cell,
        }
    }

    /// Resolve the engine handle, or return the memoized one.
    pub fn ensure_loaded(&self) -> Result<Arc<dyn Engine>, EngineError> {
        self.engine
            .get_or_init(|| {
                let result = (self.loader)();
                match &result {
                    Ok(_) => crate::debug!("engine"; "loaded"),
                    Err(e) => crate::log!("error"; "{}", e),
                }
                result
            })
            .clone()
    }

    /// Parse text into a validated `ParsedDocument`.
    pub fn parse(&self, text: &str) -> Result<ParsedDocument, EngineError> {
        let engine = self.ensure_loaded()?;
        let document = engine.parse(text)?;
        validate_views(document.views())?;
        Ok(document)
    }

    /// Compute the layout for `document`.
    pub fn compute_layout(&self, document: &ParsedDocument) -> Result<Layout, EngineError> {
        let engine = self.ensure_loaded()?;
        let layout = engine.build_layout(document)?;
        if !layout.belongs_to(document) {
            return Err(EngineError::Layout(
                "engine returned a layout for a different document".into(),
            ));
        }
        Ok(layout)
    }

    /// Render one view. The returned markup always declares width/height.
    pub fn render_view(
        &self,
        document: &ParsedDocument,
        layout: &Layout,
        options: &RenderOptions,
    ) -> Result<VisualOutput, EngineError> {
        let engine = self.ensure_loaded()?;

        if !layout.belongs_to(document) {
            return Err(EngineError::Render(
                "layout was computed for a different document".into(),
            ));
        }
        if let Some(name) = &options.view
            && document.view(name).is_none()
        {
            return Err(EngineError::Render(format!("unknown view `{name}`")));
        }
        if !is_valid_size(options.width) || !is_valid_size(options.height) {
            return Err(EngineError::Render(format!(
                "invalid render size {}x{}",
                options.width, options.height
            )));
        }

        let svg = engine.render(document, layout, options)?;
        let svg = ensure_dimensions(&svg, options.width, options.height)?;

        Ok(VisualOutput {
            svg,
            view: options.view.clone(),
            theme: options.theme,
            width: options.width,
            height: options.height,
        })
    }
}

fn is_valid_size(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// View names must be non-empty and unique; sizes finite and positive.
fn validate_views(views: &[View]) -> Result<(), EngineError> {
    let mut seen = FxHashSet::default();
    for (index, view) in views.iter().enumerate() {
        if view.name.trim().is_empty() {
            return Err(EngineError::parse(format!(
                "view #{} has an empty name",
                index + 1
            )));
        }
        if !seen.insert(view.name.as_str()) {
            return Err(EngineError::parse(format!(
                "duplicate view name `{}`",
                view.name
            )));
        }
        if !is_valid_size(view.width) || !is_valid_size(view.height) {
            return Err(EngineError::parse(format!(
                "view `{}` has invalid size {}x{}",
                view.name, view.width, view.height
            )));
        }
    }
    Ok(())
}
