//! `glimpse preview`: the file-based preview host.
//!
//! One coordinator session follows the source file. Every rendered visual is
//! written to the output SVG, and a status line reports the current view,
//! theme and zoom. Commands typed on stdin drive the session:
//!
//! ```text
//! theme light|dark    toggle         view <name>
//! zoom in|out|reset|<factor>         export <format> [path]
//! help                quit
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::export::{read_source, report};
use super::watch::SourceWatcher;
use super::{PreviewArgs, engine_gateway, export_orchestrator, shutdown};
use crate::config::cfg;
use crate::engine::Theme;
use crate::export::{ExportFormat, ExportOrchestrator, ExportRequest};
use crate::logger::{status_detach, status_error, status_info, status_success};
use crate::preview::{PreviewCoordinator, PreviewEvent, PreviewSettings, SessionId, ZoomAction};
use crate::utils::path::normalize_path;
use crate::{debug, log};

const HELP: &str = "commands: theme light|dark, toggle, view <name>, \
                    zoom in|out|reset|<factor>, export <format> [path], quit";

/// A line typed on stdin.
#[derive(Debug, Clone, PartialEq)]
enum HostCommand {
    Theme(Theme),
    Toggle,
    View(String),
    Zoom(ZoomAction),
    Export {
        format: ExportFormat,
        destination: Option<PathBuf>,
    },
    Help,
    Quit,
}

impl HostCommand {
    fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = words.collect();

        let command = match (head, rest.as_slice()) {
            ("theme", [name]) => Self::Theme(name.parse()?),
            ("toggle", []) => Self::Toggle,
            // View names may contain spaces
            ("view", [_, ..]) => Self::View(rest.join(" ")),
            ("zoom", [arg]) => Self::Zoom(parse_zoom(arg)?),
            ("export", [format, destination @ ..]) if destination.len() <= 1 => Self::Export {
                format: ExportFormat::parse(format).map_err(|e| e.to_string())?,
                destination: destination.first().map(PathBuf::from),
            },
            ("help" | "?", []) => Self::Help,
            ("quit" | "q" | "exit", []) => Self::Quit,
            _ => return Err(format!("unrecognized command `{}`", line.trim())),
        };
        Ok(Some(command))
    }
}

fn parse_zoom(arg: &str) -> Result<ZoomAction, String> {
    match arg {
        "in" | "+" => Ok(ZoomAction::In),
        "out" | "-" => Ok(ZoomAction::Out),
        "reset" | "0" => Ok(ZoomAction::Reset),
        other => other
            .trim_end_matches('%')
            .parse::<f64>()
            .map(|v| ZoomAction::Set(if other.ends_with('%') { v / 100.0 } else { v }))
            .map_err(|_| format!("invalid zoom `{other}`")),
    }
}

/// Default preview output: `<stem>.preview.svg` next to the source.
fn default_output(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    source.with_file_name(format!("{stem}.preview.svg"))
}

/// Stand-in visual shown while the document does not render.
fn error_svg(summary: &str, message: &str) -> String {
    const LINE_HEIGHT: usize = 20;
    let lines: Vec<&str> = std::iter::once(summary).chain(message.lines()).collect();
    let height = 40 + lines.len() * LINE_HEIGHT;

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"640\" height=\"{height}\">\
         <rect width=\"100%\" height=\"100%\" fill=\"#fff4f4\"/>\
         <g font-family=\"monospace\" font-size=\"14\" fill=\"#b00020\">"
    );
    for (i, line) in lines.iter().enumerate() {
        let y = 30 + i * LINE_HEIGHT;
        svg.push_str(&format!("<text x=\"16\" y=\"{y}\">{}</text>", escape_xml(line)));
    }
    svg.push_str("</g></svg>");
    svg
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Forward stdin lines until EOF.
fn spawn_command_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(8);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
    rx
}

pub async fn run_preview(args: &PreviewArgs) -> Result<()> {
    let config = cfg();
    let source = normalize_path(&args.file);
    let output = args
        .output
        .as_deref()
        .map(normalize_path)
        .unwrap_or_else(|| default_output(&source));
    let text = read_source(&source).await?;

    let gateway = engine_gateway(&config);
    let mut settings = PreviewSettings::from(&config.preview);
    settings.initial_view = args.view.clone();

    let (mut coordinator, mut events) = PreviewCoordinator::new(gateway.clone(), settings);
    let orchestrator = export_orchestrator(&config, gateway);
    let id = coordinator.open();

    let (_watcher, mut changes) = SourceWatcher::new(&source)?;
    let mut commands = spawn_command_reader();
    let mut stdin_open = true;
    let ctrl_c = shutdown::listen();

    log!("preview"; "{} -> {}", source.display(), output.display());
    debug!("preview"; "{}", HELP);
    coordinator.on_focus_change(id, source.as_path(), text).await?;

    let host = Host {
        id,
        source: &source,
        output: &output,
        orchestrator: &orchestrator,
    };

    loop {
        tokio::select! {
            biased;

            _ = ctrl_c.notified() => break,

            Some(event) = events.recv() => host.present(event).await,

            Some(()) = changes.recv() => match read_source(&source).await {
                Ok(text) => coordinator.on_edit(id, text).await?,
                // Mid-save rename; the create event follows
                Err(e) => debug!("watch"; "{:#}", e),
            },

            line = commands.recv(), if stdin_open => match line {
                Some(line) => match HostCommand::parse(&line) {
                    Ok(Some(HostCommand::Quit)) => break,
                    Ok(Some(command)) => host.run(&coordinator, command).await?,
                    Ok(None) => {}
                    Err(message) => status_error(&message, HELP),
                },
                None => stdin_open = false,
            },
        }

        if shutdown::is_shutdown() {
            break;
        }
    }

    coordinator.close(id).await?;
    Ok(())
}

/// What the loop needs to act on events and commands.
struct Host<'a> {
    id: SessionId,
    source: &'a Path,
    output: &'a Path,
    orchestrator: &'a ExportOrchestrator,
}

impl Host<'_> {
    async fn present(&self, event: PreviewEvent) {
        match event {
            PreviewEvent::Rendered {
                visual,
                views,
                selected,
                revision,
                zoom,
                ..
            } => {
                if let Err(e) = tokio::fs::write(self.output, &visual.svg).await {
                    status_error(&format!("cannot write {}", self.output.display()), &e.to_string());
                    return;
                }
                let view = selected.as_deref().unwrap_or("(no views)");
                status_success(&format!(
                    "{view} [{}] {} {:.0}% r{revision}",
                    views.join(", "),
                    visual.theme,
                    zoom * 100.0,
                ));
            }
            PreviewEvent::Failed { message, fatal, .. } => {
                let summary = if fatal {
                    "engine unavailable, edits are no longer processed"
                } else {
                    "preview not updated"
                };
                if let Err(e) = tokio::fs::write(self.output, error_svg(summary, &message)).await {
                    debug!("preview"; "cannot write {}: {}", self.output.display(), e);
                }
                status_error(summary, &message);
            }
            PreviewEvent::Zoomed { zoom, .. } => {
                status_info(&format!("zoom {:.0}%", zoom * 100.0));
            }
        }
    }

    async fn run(&self, coordinator: &PreviewCoordinator, command: HostCommand) -> Result<()> {
        match command {
            HostCommand::Theme(theme) => coordinator.on_theme_toggle(self.id, theme).await?,
            HostCommand::Toggle => coordinator.toggle_theme(self.id).await?,
            HostCommand::View(name) => coordinator.on_view_select(self.id, name).await?,
            HostCommand::Zoom(action) => coordinator.on_zoom(self.id, action).await?,
            HostCommand::Export {
                format,
                destination,
            } => self.export(coordinator, format, destination).await?,
            HostCommand::Help => status_info(HELP),
            HostCommand::Quit => {}
        }
        Ok(())
    }

    async fn export(
        &self,
        coordinator: &PreviewCoordinator,
        format: ExportFormat,
        destination: Option<PathBuf>,
    ) -> Result<()> {
        let Some(snapshot) = coordinator.snapshot(self.id).await? else {
            status_error("nothing to export yet", "the document has not rendered successfully");
            return Ok(());
        };

        let request = ExportRequest {
            source: self.source.to_path_buf(),
            document: snapshot.document,
            layout: snapshot.layout,
            format,
            theme: snapshot.theme,
            destination,
        };

        status_detach();
        if let Err(e) = report(self.orchestrator.export(request).await) {
            log!("error"; "{:#}", e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> HostCommand {
        HostCommand::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("theme dark"), HostCommand::Theme(Theme::Dark));
        assert_eq!(parse("  toggle "), HostCommand::Toggle);
        assert_eq!(parse("view Sign In"), HostCommand::View("Sign In".into()));
        assert_eq!(parse("q"), HostCommand::Quit);
        assert_eq!(parse("help"), HostCommand::Help);
        assert_eq!(HostCommand::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_zoom() {
        assert_eq!(parse("zoom in"), HostCommand::Zoom(ZoomAction::In));
        assert_eq!(parse("zoom -"), HostCommand::Zoom(ZoomAction::Out));
        assert_eq!(parse("zoom reset"), HostCommand::Zoom(ZoomAction::Reset));
        assert_eq!(parse("zoom 1.5"), HostCommand::Zoom(ZoomAction::Set(1.5)));
        assert_eq!(parse("zoom 150%"), HostCommand::Zoom(ZoomAction::Set(1.5)));
        assert!(HostCommand::parse("zoom huge").is_err());
    }

    #[test]
    fn test_parse_export() {
        assert_eq!(
            parse("export raster"),
            HostCommand::Export {
                format: ExportFormat::Raster,
                destination: None
            }
        );
        assert_eq!(
            parse("export vector out/"),
            HostCommand::Export {
                format: ExportFormat::Vector,
                destination: Some(PathBuf::from("out/"))
            }
        );
        assert!(HostCommand::parse("export gif").is_err());
        assert!(HostCommand::parse("export raster a b").is_err());
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(HostCommand::parse("theme").is_err());
        assert!(HostCommand::parse("theme sepia").is_err());
        assert!(HostCommand::parse("fly away").is_err());
    }

    #[test]
    fn test_error_svg_escapes_message() {
        let svg = error_svg("preview not updated", "parse error on line 3: expected `>`\n<view>");
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("height=\"100\""));
        assert!(svg.contains("expected `&gt;`"));
        assert!(svg.contains("&lt;view&gt;"));
        assert!(!svg.contains("<view>"));
    }

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("/p/app.ui")),
            PathBuf::from("/p/app.preview.svg")
        );
    }
}
