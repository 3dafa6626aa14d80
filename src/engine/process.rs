//! Engine executable binding.
//!
//! Each engine operation is one process invocation; payloads travel as JSON
//! on stdin/stdout:
//!
//! ```text
//! <cmd> <args…> parse                     stdin: text          stdout: {"views": [...], ...}
//! <cmd> <args…> layout                    stdin: document      stdout: layout json
//! <cmd> <args…> render --theme T          stdin: {"document", "layout"}
//!              --width W --height H       stdout: svg markup
//!              [--view NAME]
//! ```
//!
//! A failing invocation exits non-zero and writes either
//! `{"message": "...", "line": N}` or plain text to stderr.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Value, json};

use super::{Engine, EngineError, Layout, ParsedDocument, RenderOptions, View};
use crate::utils::exec::{Cmd, failure_message};

/// Engine implemented by an external executable.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

/// Structured stderr of a failed invocation.
#[derive(Debug, Deserialize)]
struct WireError {
    message: String,
    #[serde(default)]
    line: Option<u32>,
}

/// Why an invocation failed, before mapping to an operation-specific kind.
enum Failure {
    /// The process could not run at all
    Spawn(String),
    /// The process ran and reported an error
    Reported { message: String, line: Option<u32> },
}

impl ProcessEngine {
    /// Resolve `command` to an executable.
    ///
    /// Commands containing a path separator are taken relative to `root`;
    /// bare names are looked up on `PATH`.
    pub fn resolve(command: &str, args: &[String], root: &Path) -> Result<Self, EngineError> {
        let expanded = shellexpand::tilde(command).into_owned();
        if expanded.trim().is_empty() {
            return Err(EngineError::Load("no engine command configured".into()));
        }

        let candidate = Path::new(&expanded);
        let program = if candidate.components().count() > 1 || candidate.is_absolute() {
            let path = if candidate.is_absolute() {
                candidate.to_path_buf()
            } else {
                root.join(candidate)
            };
            which::which(&path).map_err(|e| {
                EngineError::Load(format!("cannot use engine `{}`: {e}", path.display()))
            })?
        } else {
            which::which(&expanded)
                .map_err(|e| EngineError::Load(format!("cannot find engine `{expanded}`: {e}")))?
        };

        crate::debug!("engine"; "resolved {}", program.display());
        Ok(Self {
            program,
            args: args.to_vec(),
            cwd: Some(root.to_path_buf()).filter(|p| p.is_dir()),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn invoke(&self, operation: &str, extra: &[String], stdin: &[u8]) -> Result<Vec<u8>, Failure> {
        let mut cmd = Cmd::new(&self.program)
            .args(&self.args)
            .arg(operation)
            .args(extra)
            .stdin(stdin);
        if let Some(dir) = &self.cwd {
            cmd = cmd.cwd(dir);
        }

        let output = cmd.run().map_err(|e| Failure::Spawn(format!("{e:#}")))?;
        if output.status.success() {
            return Ok(output.stdout);
        }

        let raw = failure_message(&output);
        Err(match serde_json::from_str::<WireError>(&raw) {
            Ok(wire) => Failure::Reported {
                message: wire.message,
                line: wire.line,
            },
            Err(_) => Failure::Reported {
                message: raw,
                line: None,
            },
        })
    }

    fn invoke_json(
        &self,
        operation: &str,
        stdin: &[u8],
        to_error: fn(String) -> EngineError,
    ) -> Result<Value, EngineError> {
        let stdout = self
            .invoke(operation, &[], stdin)
            .map_err(|failure| match failure {
                Failure::Spawn(message) | Failure::Reported { message, .. } => to_error(message),
            })?;
        serde_json::from_slice(&stdout)
            .map_err(|e| to_error(format!("engine `{operation}` returned invalid json: {e}")))
    }
}

impl Engine for ProcessEngine {
    fn parse(&self, text: &str) -> Result<ParsedDocument, EngineError> {
        let stdout = self
            .invoke("parse", &[], text.as_bytes())
            .map_err(|failure| match failure {
                Failure::Spawn(message) => EngineError::parse(message),
                Failure::Reported { message, line } => EngineError::Parse { message, line },
            })?;

        let body: Value = serde_json::from_slice(&stdout)
            .map_err(|e| EngineError::parse(format!("engine returned invalid json: {e}")))?;
        let views: Vec<View> = match body.get("views") {
            Some(views) => serde_json::from_value(views.clone())
                .map_err(|e| EngineError::parse(format!("malformed view list: {e}")))?,
            None => Vec::new(),
        };

        Ok(ParsedDocument::new(views, body))
    }

    fn build_layout(&self, document: &ParsedDocument) -> Result<Layout, EngineError> {
        let stdin = serde_json::to_vec(document.body())
            .map_err(|e| EngineError::Layout(e.to_string()))?;
        let body = self.invoke_json("layout", &stdin, EngineError::Layout)?;
        Ok(Layout::new(document, body))
    }

    fn render(
        &self,
        document: &ParsedDocument,
        layout: &Layout,
        options: &RenderOptions,
    ) -> Result<String, EngineError> {
        let mut extra = vec![
            "--theme".to_string(),
            options.theme.to_string(),
            "--width".to_string(),
            options.width.to_string(),
            "--height".to_string(),
            options.height.to_string(),
        ];
        if let Some(view) = &options.view {
            extra.push("--view".to_string());
            extra.push(view.clone());
        }

        let payload = json!({ "document": document.body(), "layout": layout.body() });
        let stdin = serde_json::to_vec(&payload).map_err(|e| EngineError::Render(e.to_string()))?;

        let stdout = self
            .invoke("render", &extra, &stdin)
            .map_err(|failure| match failure {
                Failure::Spawn(message) | Failure::Reported { message, .. } => {
                    EngineError::Render(message)
                }
            })?;

        String::from_utf8(stdout)
            .map_err(|_| EngineError::Render("engine returned non-utf8 svg".into()))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::engine::{EngineGateway, Theme};
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Arc;
    use tempfile::TempDir;

    const SCRIPT: &str = r#"#!/bin/sh
op="$1"
shift
input=$(cat)
case "$op" in
  parse)
    case "$input" in
      *bad*) echo '{"message":"unexpected token","line":3}' >&2; exit 2 ;;
    esac
    echo '{"views":[{"name":"Main","width":100,"height":50}],"nodes":1}'
    ;;
  layout)
    echo '{"boxes":[]}'
    ;;
  render)
    echo "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 100 50\"><desc>$*</desc></svg>"
    ;;
  *)
    echo "unknown operation $op" >&2
    exit 1
    ;;
esac
"#;

    fn install_engine() -> (TempDir, ProcessEngine) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine.sh");
        std::fs::write(&path, SCRIPT).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        let engine = ProcessEngine::resolve("./engine.sh", &[], dir.path()).unwrap();
        (dir, engine)
    }

    #[test]
    fn test_resolve_missing_command() {
        let err = ProcessEngine::resolve("no-such-engine-xyz", &[], Path::new("/")).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_resolve_empty_command() {
        let err = ProcessEngine::resolve("  ", &[], Path::new("/")).unwrap_err();
        assert!(matches!(err, EngineError::Load(_)));
    }

    #[test]
    fn test_full_pipeline_through_script() {
        let (_dir, engine) = install_engine();
        let gateway = EngineGateway::with_engine(Arc::new(engine));

        let doc = gateway.parse("view Main").unwrap();
        assert_eq!(doc.view_names(), vec!["Main"]);
        assert_eq!(doc.body()["nodes"], 1);

        let layout = gateway.compute_layout(&doc).unwrap();
        assert_eq!(layout.body()["boxes"], json!([]));

        let options = RenderOptions::for_view(&doc.views()[0], Theme::Dark);
        let visual = gateway.render_view(&doc, &layout, &options).unwrap();
        assert!(visual.svg.contains("--theme dark --width 100 --height 50 --view Main"));
        assert!(visual.svg.contains(r#"width="100""#));
    }

    #[test]
    fn test_structured_parse_error() {
        let (_dir, engine) = install_engine();
        let err = engine.parse("this is bad").unwrap_err();
        assert_eq!(err, EngineError::parse_at("unexpected token", 3));
    }
}
