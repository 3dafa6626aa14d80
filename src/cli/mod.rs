//! Command-line entry points.
//!
//! - `args` - clap definitions
//! - `preview` - watch a document and keep its rendering on disk current
//! - `export` - one-shot export
//! - `watch` - source file watcher
//! - `shutdown` - Ctrl+C routing

mod args;
pub mod export;
pub mod preview;
mod shutdown;
mod watch;

use std::sync::Arc;

pub use args::{Cli, Commands, ExportArgs, PreviewArgs};
pub use shutdown::{is_shutdown, setup_shutdown_handler};

use crate::config::GlimpseConfig;
use crate::engine::{Engine, EngineGateway, ProcessEngine};
use crate::export::{DestinationResolver, ExportOrchestrator, JsonStateStore};

/// Gateway over the configured engine executable, resolved on first use.
pub(crate) fn engine_gateway(config: &GlimpseConfig) -> Arc<EngineGateway> {
    let command = config.engine.command.clone();
    let args = config.engine.args.clone();
    let root = config.root.clone();

    Arc::new(EngineGateway::new(move || {
        let engine = ProcessEngine::resolve(&command, &args, &root)?;
        Ok(Arc::new(engine) as Arc<dyn Engine>)
    }))
}

/// Orchestrator that remembers its last directory in `[export] state_file`.
pub(crate) fn export_orchestrator(
    config: &GlimpseConfig,
    gateway: Arc<EngineGateway>,
) -> ExportOrchestrator {
    let store = Arc::new(JsonStateStore::open(&config.export.state_file));
    let resolver = Arc::new(DestinationResolver::new(store));
    ExportOrchestrator::new(gateway, resolver, (&config.export).into())
}
