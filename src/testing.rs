//! Test doubles shared by unit tests.
//!
//! `FakeEngine` understands a tiny line format, one view per line:
//!
//! ```text
//! Login 320x480
//! Dashboard 1024x768
//! ```
//!
//! A line containing `!` is a parse error on that line. Every engine call is
//! counted so tests can assert which pipeline stages ran.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde_json::json;

use crate::engine::{
    Engine, EngineError, EngineGateway, Layout, ParsedDocument, RenderOptions, View,
};

#[derive(Default)]
pub struct FakeEngine {
    parse_calls: AtomicUsize,
    layout_calls: AtomicUsize,
    render_calls: AtomicUsize,
    /// Source text of the document behind each render call
    rendered_sources: Mutex<Vec<String>>,
    /// Options of each render call
    render_options: Mutex<Vec<RenderOptions>>,
    failing_views: Mutex<Vec<String>>,
    /// Gate for the next parse call: signals entry, then waits for release
    held_parse: Mutex<Option<(Sender<()>, Receiver<()>)>>,
    omit_dimensions: bool,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit SVG with only a viewBox, leaving width/height to the gateway.
    pub fn without_dimensions(mut self) -> Self {
        self.omit_dimensions = true;
        self
    }

    /// Make rendering of `view` fail.
    pub fn fail_view(&self, view: &str) {
        self.failing_views.lock().push(view.to_string());
    }

    /// Block the next parse call until released. Returns a receiver that
    /// fires once the parse has started and the sender that releases it.
    pub fn hold_next_parse(&self) -> (Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = channel();
        let (release_tx, release_rx) = channel();
        *self.held_parse.lock() = Some((entered_tx, release_rx));
        (entered_rx, release_tx)
    }

    pub fn parse_calls(&self) -> usize {
        self.parse_calls.load(Ordering::SeqCst)
    }

    pub fn layout_calls(&self) -> usize {
        self.layout_calls.load(Ordering::SeqCst)
    }

    pub fn render_calls(&self) -> usize {
        self.render_calls.load(Ordering::SeqCst)
    }

    pub fn rendered_sources(&self) -> Vec<String> {
        self.rendered_sources.lock().clone()
    }

    pub fn render_options(&self) -> Vec<RenderOptions> {
        self.render_options.lock().clone()
    }
}

impl Engine for FakeEngine {
    fn parse(&self, text: &str) -> Result<ParsedDocument, EngineError> {
        self.parse_calls.fetch_add(1, Ordering::SeqCst);

        let held = self.held_parse.lock().take();
        if let Some((entered, release)) = held {
            let _ = entered.send(());
            let _ = release.recv();
        }

        let mut views = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let line_no = u32::try_from(index + 1).unwrap_or(u32::MAX);
            if line.contains('!') {
                return Err(EngineError::parse_at("unexpected `!`", line_no));
            }
            let (name, size) = line
                .rsplit_once(' ')
                .ok_or_else(|| EngineError::parse_at("expected `<name> <w>x<h>`", line_no))?;
            let (w, h) = size
                .split_once('x')
                .ok_or_else(|| EngineError::parse_at("expected `<w>x<h>`", line_no))?;
            let width = w
                .parse()
                .map_err(|_| EngineError::parse_at("bad width", line_no))?;
            let height = h
                .parse()
                .map_err(|_| EngineError::parse_at("bad height", line_no))?;
            views.push(View::new(name.trim(), width, height));
        }

        Ok(ParsedDocument::new(views, json!({ "source": text })))
    }

    fn build_layout(&self, document: &ParsedDocument) -> Result<Layout, EngineError> {
        self.layout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Layout::new(document, json!({ "views": document.views().len() })))
    }

    fn render(
        &self,
        document: &ParsedDocument,
        _layout: &Layout,
        options: &RenderOptions,
    ) -> Result<String, EngineError> {
        self.render_calls.fetch_add(1, Ordering::SeqCst);
        self.render_options.lock().push(options.clone());
        let source = document.body()["source"].as_str().unwrap_or_default();
        self.rendered_sources.lock().push(source.to_string());

        if let Some(view) = &options.view
            && self.failing_views.lock().contains(view)
        {
            return Err(EngineError::Render(format!("cannot draw `{view}`")));
        }

        let fill = match options.theme {
            crate::engine::Theme::Light => "#3366cc",
            crate::engine::Theme::Dark => "#99bbff",
        };
        let (w, h) = (options.width, options.height);
        let size = if self.omit_dimensions {
            String::new()
        } else {
            format!(r#" width="{w}" height="{h}""#)
        };
        Ok(format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg"{size} viewBox="0 0 {w} {h}"><rect x="0" y="0" width="{w}" height="{h}" fill="{fill}"/></svg>"#
        ))
    }
}

/// Gateway over a shared fake, keeping the fake reachable for assertions.
pub fn fake_gateway() -> (Arc<FakeEngine>, Arc<EngineGateway>) {
    let engine = Arc::new(FakeEngine::new());
    let gateway = Arc::new(EngineGateway::with_engine(
        Arc::clone(&engine) as Arc<dyn Engine>
    ));
    (engine, gateway)
}
